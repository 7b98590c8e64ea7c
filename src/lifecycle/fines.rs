//! Late-return fines

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::FineStatus;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Started days between `due_date` and `returned_at`; zero when on time.
pub fn days_late(due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> i64 {
    let late_ms = (returned_at - due_date).num_milliseconds();
    if late_ms <= 0 {
        return 0;
    }
    (late_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// `max(0, ceil((returned - due) / 1 day)) * rate_per_day`
pub fn calculate_fine(
    due_date: DateTime<Utc>,
    returned_at: DateTime<Utc>,
    rate_per_day: Decimal,
) -> Decimal {
    Decimal::from(days_late(due_date, returned_at)) * rate_per_day
}

pub fn fine_status_for(fine: Decimal) -> FineStatus {
    if fine > Decimal::ZERO {
        FineStatus::Pending
    } else {
        FineStatus::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_on_time_return_costs_nothing() {
        assert_eq!(calculate_fine(due(), due(), Decimal::from(5)), Decimal::ZERO);
    }

    #[test]
    fn test_early_return_costs_nothing() {
        let early = due() - Duration::days(4);
        assert_eq!(calculate_fine(due(), early, Decimal::from(5)), Decimal::ZERO);
    }

    #[test]
    fn test_three_days_late() {
        let late = due() + Duration::days(3);
        assert_eq!(calculate_fine(due(), late, Decimal::from(5)), Decimal::from(15));
    }

    #[test]
    fn test_partial_day_counts_as_a_full_day() {
        let late = due() + Duration::hours(1);
        assert_eq!(days_late(due(), late), 1);
        let late = due() + Duration::days(2) + Duration::minutes(1);
        assert_eq!(days_late(due(), late), 3);
    }

    #[test]
    fn test_fine_is_stable_across_calls() {
        let late = due() + Duration::days(5);
        let first = calculate_fine(due(), late, Decimal::new(250, 2));
        let second = calculate_fine(due(), late, Decimal::new(250, 2));
        assert_eq!(first, second);
        assert_eq!(first, Decimal::new(1250, 2));
    }

    #[test]
    fn test_fine_status() {
        assert_eq!(fine_status_for(Decimal::ZERO), FineStatus::None);
        assert_eq!(fine_status_for(Decimal::from(25)), FineStatus::Pending);
    }
}
