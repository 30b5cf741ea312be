//! Senken-Abstraktion fuer ausgehende Frames
//!
//! Die `Senke` ist die Schnittstelle zwischen Registry/Gateway und der
//! Transportschicht: jede Verbindung stellt genau eine Senke bereit, ueber
//! die serialisierte Frames an den Client ausgeliefert werden. Die konkrete
//! Implementierung (gebundene mpsc-Queue, geleert von genau einem Schreiber
//! pro Verbindung) liegt im Gateway-Crate.

use std::sync::Arc;

/// Ausgehender Kanal einer Verbindung
///
/// `senden` reiht nicht-blockierend ein und darf nie auf I/O warten –
/// Aufrufer halten zu diesem Zeitpunkt keine Registry-Locks mehr, aber die
/// Zustellung bleibt ein reines Einreihen in die Queue der Verbindung.
pub trait Senke: Send + Sync + std::fmt::Debug {
    /// Reiht serialisierte Frame-Bytes zur Auslieferung ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder die Verbindung bereits
    /// beendet ist; der Frame ist dann verworfen.
    fn senden(&self, daten: Vec<u8>) -> bool;

    /// Fordert das Schliessen der Verbindung an (best-effort)
    fn schliessen(&self);
}

/// Geteilter Handle auf die Senke einer Verbindung
pub type SenkenHandle = Arc<dyn Senke>;
