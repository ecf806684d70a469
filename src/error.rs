use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Trade-open and administrative rejections.
///
/// Validation failures are reported with the specific reason and are never
/// coerced into a valid request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("invalid amount {amount}: must be greater than 0")]
    InvalidAmount { amount: Decimal },

    #[error("invalid expiration {seconds}s: must be a multiple of {step}s between {min}s and {max}s")]
    InvalidExpiration {
        seconds: u64,
        step: u64,
        min: u64,
        max: u64,
    },

    #[error("invalid direction '{0}': expected CALL or PUT")]
    InvalidDirection(String),

    #[error("insufficient balance: {available} < {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },

    #[error("market closed for {instrument}: {reason}")]
    MarketClosed { instrument: String, reason: String },

    #[error("no price available for {0}")]
    PriceUnavailable(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("trade not found: {0}")]
    TradeNotFound(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("{resource} {id} does not belong to user {user_id}")]
    Forbidden {
        resource: &'static str,
        id: String,
        user_id: String,
    },

    #[error("invalid payout {percent}%: must be between {min}% and {max}%")]
    InvalidPayout { percent: u32, min: u32, max: u32 },
}

/// Ledger port failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("insufficient funds in {account}: {available} < {required}")]
    InsufficientFunds {
        account: String,
        available: Decimal,
        required: Decimal,
    },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Trade and price store port failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
