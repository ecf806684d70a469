//! Instrument definitions and the payout registry.

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::InstrumentId;
use super::market::MarketCalendar;
use crate::error::TradeError;

/// Lowest payout percentage an instrument may carry.
pub const MIN_PAYOUT_PERCENT: u32 = 60;
/// Highest payout percentage an instrument may carry.
pub const MAX_PAYOUT_PERCENT: u32 = 90;
/// Payout used when none is configured.
pub const DEFAULT_PAYOUT_PERCENT: u32 = 75;

/// Random-walk parameters for an instrument's simulated price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    pub initial_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Maximum relative move per tick (0.01 = 1%).
    pub volatility: f64,
}

/// A tradable synthetic asset pair.
///
/// Identity and price model are immutable; the payout lives in
/// [`InstrumentRegistry`] because it is the only field that changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    id: InstrumentId,
    base: String,
    quote: String,
    digits: u32,
    model: PriceModel,
    calendar: MarketCalendar,
}

impl Instrument {
    /// Create a new instrument.
    #[must_use]
    pub fn new(
        id: InstrumentId,
        base: impl Into<String>,
        quote: impl Into<String>,
        digits: u32,
        model: PriceModel,
        calendar: MarketCalendar,
    ) -> Self {
        Self {
            id,
            base: base.into(),
            quote: quote.into(),
            digits,
            model,
            calendar,
        }
    }

    #[must_use]
    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Price precision in decimal digits.
    #[must_use]
    pub fn digits(&self) -> u32 {
        self.digits
    }

    #[must_use]
    pub fn model(&self) -> &PriceModel {
        &self.model
    }

    #[must_use]
    pub fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }

    /// Round a raw price to this instrument's precision.
    #[must_use]
    pub fn round_price(&self, price: f64) -> f64 {
        let factor = 10f64.powi(self.digits as i32);
        (price * factor).round() / factor
    }
}

/// Validate a payout percentage against the allowed range.
pub fn validate_payout(percent: u32) -> Result<u32, TradeError> {
    if (MIN_PAYOUT_PERCENT..=MAX_PAYOUT_PERCENT).contains(&percent) {
        Ok(percent)
    } else {
        Err(TradeError::InvalidPayout {
            percent,
            min: MIN_PAYOUT_PERCENT,
            max: MAX_PAYOUT_PERCENT,
        })
    }
}

/// Convert a payout percentage to the ratio credited as profit (75 -> 0.75).
#[must_use]
pub fn payout_ratio(percent: u32) -> Decimal {
    Decimal::from(percent) / Decimal::from(100)
}

/// Process-wide set of configured instruments plus their mutable payouts.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    instruments: Vec<Instrument>,
    payouts: RwLock<HashMap<InstrumentId, u32>>,
}

impl InstrumentRegistry {
    /// Create a registry. Instruments without a payout get
    /// [`DEFAULT_PAYOUT_PERCENT`].
    #[must_use]
    pub fn new(entries: Vec<(Instrument, Option<u32>)>) -> Self {
        let mut instruments = Vec::with_capacity(entries.len());
        let mut payouts = HashMap::with_capacity(entries.len());
        for (instrument, payout) in entries {
            payouts.insert(
                instrument.id().clone(),
                payout.unwrap_or(DEFAULT_PAYOUT_PERCENT),
            );
            instruments.push(instrument);
        }
        Self {
            instruments,
            payouts: RwLock::new(payouts),
        }
    }

    /// Look up an instrument by ID.
    #[must_use]
    pub fn get(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id() == id)
    }

    /// All configured instruments in configuration order.
    #[must_use]
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// All configured instrument IDs in configuration order.
    #[must_use]
    pub fn ids(&self) -> Vec<InstrumentId> {
        self.instruments.iter().map(|i| i.id().clone()).collect()
    }

    /// Current payout percentage for an instrument.
    #[must_use]
    pub fn payout_percent(&self, id: &InstrumentId) -> Option<u32> {
        self.payouts.read().get(id).copied()
    }

    /// Administrative payout change.
    pub fn set_payout(&self, id: &InstrumentId, percent: u32) -> Result<(), TradeError> {
        let percent = validate_payout(percent)?;
        let mut payouts = self.payouts.write();
        let slot = payouts
            .get_mut(id)
            .ok_or_else(|| TradeError::UnknownInstrument(id.to_string()))?;
        *slot = percent;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
