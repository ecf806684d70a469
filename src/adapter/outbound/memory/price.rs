//! Thread-safe last-price cache.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{InstrumentId, PriceTick};
use crate::error::StoreError;
use crate::port::PriceStore;

/// Thread-safe cache of the latest tick per instrument.
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    ticks: RwLock<HashMap<InstrumentId, PriceTick>>,
}

impl MemoryPriceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instruments with a stored price.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PriceStore for MemoryPriceStore {
    fn put(&self, tick: &PriceTick) -> Result<(), StoreError> {
        self.ticks
            .write()
            .insert(tick.instrument.clone(), tick.clone());
        Ok(())
    }

    fn get(&self, instrument: &InstrumentId) -> Option<PriceTick> {
        self.ticks.read().get(instrument).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn put_replaces_previous_tick() {
        let store = MemoryPriceStore::new();
        let id = InstrumentId::from("BTCUSD");

        store
            .put(&PriceTick::new(id.clone(), 100.0, Utc::now()))
            .unwrap();
        store
            .put(&PriceTick::new(id.clone(), 101.5, Utc::now()))
            .unwrap();

        assert_eq!(store.get(&id).map(|t| t.price), Some(101.5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown_is_none() {
        let store = MemoryPriceStore::new();
        assert!(store.get(&InstrumentId::from("NOPE")).is_none());
        assert!(store.is_empty());
    }
}
