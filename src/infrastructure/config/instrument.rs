//! Instrument definitions.

use serde::Deserialize;

use crate::domain::{Instrument, InstrumentId, InstrumentRegistry, MarketCalendar, PriceModel};

/// One `[[instruments]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    pub id: String,
    pub base: String,
    pub quote: String,
    /// Decimal places prices are rounded to.
    #[serde(default = "default_digits")]
    pub digits: u32,
    pub initial_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Maximum relative move per tick (0.001 = 0.1%).
    pub volatility: f64,
    /// Payout percentage; 75 when omitted.
    #[serde(default)]
    pub payout: Option<u32>,
    #[serde(default = "MarketCalendar::always_open")]
    pub calendar: MarketCalendar,
}

const fn default_digits() -> u32 {
    2
}

impl InstrumentConfig {
    #[must_use]
    pub fn to_instrument(&self) -> Instrument {
        Instrument::new(
            InstrumentId::new(&self.id),
            &self.base,
            &self.quote,
            self.digits,
            PriceModel {
                initial_price: self.initial_price,
                min_price: self.min_price,
                max_price: self.max_price,
                volatility: self.volatility,
            },
            self.calendar.clone(),
        )
    }
}

/// Build the payout registry from configured instruments.
#[must_use]
pub fn build_registry(instruments: &[InstrumentConfig]) -> InstrumentRegistry {
    InstrumentRegistry::new(
        instruments
            .iter()
            .map(|c| (c.to_instrument(), c.payout))
            .collect(),
    )
}
