//! Last-price cache port.

use crate::domain::{InstrumentId, PriceTick};
use crate::error::StoreError;

/// Latest tick per instrument.
///
/// Writes come only from the instrument's generator; reads come from
/// settlement, snapshots and the engine. Implementations must tolerate
/// concurrent `put`/`get` without tearing a tick.
pub trait PriceStore: Send + Sync {
    /// Replace the latest tick for the tick's instrument.
    fn put(&self, tick: &PriceTick) -> Result<(), StoreError>;

    /// Latest tick for an instrument, if one was ever stored.
    fn get(&self, instrument: &InstrumentId) -> Option<PriceTick>;
}
