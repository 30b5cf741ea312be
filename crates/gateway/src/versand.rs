//! Versand – Senken-Implementierung mit Einzel-Schreiber-Queue
//!
//! Jede Verbindung besitzt genau eine gebundene Send-Queue, die
//! ausschliesslich vom eigenen Verbindungs-Task geleert wird. Alle
//! Zusteller (Nachrichten-Routing und Sitzungs-Benachrichtigungen aus
//! fremden Tasks) reihen nicht-blockierend ueber den `Senke`-Handle ein;
//! direkte nebenlaeufige Socket-Schreiber existieren damit nicht.

use sprechstunde_core::senke::{Senke, SenkenHandle};
use tokio::sync::mpsc;

/// Groesse der Send-Queue pro Verbindung
pub const SENDE_QUEUE_GROESSE: usize = 64;

/// Auftrag in der Send-Queue einer Verbindung
#[derive(Debug)]
pub enum VersandAuftrag {
    /// Serialisierter Frame zur Auslieferung
    Frame(Vec<u8>),
    /// Die Verbindung soll sich beenden
    Schliessen,
}

/// Senke einer aktiven Verbindung
///
/// Haelt nur das Sende-Ende der Queue; das Empfangs-Ende leert der
/// Verbindungs-Task und schreibt als einziger auf den Socket.
#[derive(Debug, Clone)]
pub struct VerbindungsSenke {
    /// Kennung fuer Log-Ausgaben (Peer-Adresse)
    kennung: String,
    tx: mpsc::Sender<VersandAuftrag>,
}

impl VerbindungsSenke {
    /// Erstellt eine neue Senke samt Empfangs-Ende der Queue
    pub fn neu(kennung: impl Into<String>) -> (SenkenHandle, mpsc::Receiver<VersandAuftrag>) {
        let (tx, rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        let senke: SenkenHandle = std::sync::Arc::new(Self {
            kennung: kennung.into(),
            tx,
        });
        (senke, rx)
    }
}

impl Senke for VerbindungsSenke {
    fn senden(&self, daten: Vec<u8>) -> bool {
        match self.tx.try_send(VersandAuftrag::Frame(daten)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.kennung, "Send-Queue voll – Frame verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.kennung, "Send-Queue geschlossen (Verbindung beendet)");
                false
            }
        }
    }

    fn schliessen(&self) {
        // Best-effort: ist die Queue voll, ist die Verbindung ohnehin am
        // Abreissen oder wird vom Timeout eingeholt
        let _ = self.tx.try_send(VersandAuftrag::Schliessen);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
