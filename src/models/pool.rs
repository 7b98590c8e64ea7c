//! Resource pools: book copies and store stock

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Copies of one catalogued book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookPool {
    pub id: i32,
    pub title: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Consumable store stock; quantity has no fixed ceiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StoreItem {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
}
