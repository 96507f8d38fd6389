//! Admission of detector output into the reported anomaly list.
//!
//! The detector is stateless and re-flags the same sample on every tick it
//! stays in the window. The ledger keeps a high-water mark so each global
//! index is reported at most once, on the tick its sample arrived.

use crate::types::AnomalyEvent;

#[derive(Debug, Clone, Default)]
pub struct AnomalyLedger {
    events: Vec<AnomalyEvent>,
    /// Lowest global index not yet examined.
    next_index: usize,
}

impl AnomalyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit events at or beyond the high-water mark, then advance it to
    /// `stream_len`. Returns only the newly admitted events.
    ///
    /// `detected` must be ascending by global index, as the detector returns
    /// it.
    pub fn admit(&mut self, detected: &[AnomalyEvent], stream_len: usize) -> &[AnomalyEvent] {
        let start = self.events.len();
        let floor = self.next_index;

        self.events.extend(
            detected
                .iter()
                .filter(|e| e.global_index >= floor && e.global_index < stream_len),
        );
        self.next_index = floor.max(stream_len);

        &self.events[start..]
    }

    /// All events admitted so far, ascending by global index.
    pub fn events(&self) -> &[AnomalyEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<AnomalyEvent> {
        self.events
    }
}
