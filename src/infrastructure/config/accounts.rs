//! Demo account seeding.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One `[[accounts]]` entry: an account opened at startup and credited with
/// a bonus.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub user_id: String,
    #[serde(default)]
    pub balance: Decimal,
}
