//! Unit-Tests fuer die Kundendienst-Registry


use sprechstunde_core::senke::Senke;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Senke fuer Tests – verwirft Frames, merkt sich aber `schliessen`
#[derive(Debug, Default)]
pub(crate) struct TestSenke {
    geschlossen: AtomicBool,
}

impl TestSenke {
    pub(crate) fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn ist_geschlossen(&self) -> bool {
        self.geschlossen.load(Ordering::SeqCst)
    }
}

impl Senke for TestSenke {
    fn senden(&self, _daten: Vec<u8>) -> bool {
        true
    }

    fn schliessen(&self) {
        self.geschlossen.store(true, Ordering::SeqCst);
    }
}
