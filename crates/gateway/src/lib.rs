//! sprechstunde-gateway – Nachrichten-Gateway und TCP-Transport
//!
//! Dieses Crate uebersetzt Transport-Ereignisse in Registry-Operationen und
//! Registry-Ergebnisse in adressierte ausgehende Frames.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (GatewayServer)
//!     |
//!     v
//! ClientVerbindung (pro Verbindung ein Task, einziger Socket-Schreiber)
//!     |  erster Frame: login_user / login_staff
//!     |
//!     v
//! FrameDispatcher
//!     |
//!     +-- BenutzerHandler     (message)
//!     +-- MitarbeiterHandler  (connect_user, transfer_session, message)
//!
//! KundendienstService – Registry (ein Lock ueber alle Tabellen)
//! VerbindungsSenke    – gebundene Send-Queue pro Verbindung
//! ```
//!
//! ## Fehler-Politik
//! Fachlich ungueltige oder nicht parsebare Frames werden geloggt und
//! verworfen; die Verbindung laeuft weiter. Nur Transportfehler (Lesen,
//! Schreiben, Timeout, Shutdown) beenden den Verbindungs-Task, der dann
//! genau einmal das Trennen in der Registry nachzieht.

pub mod connection;
pub mod dispatcher;
pub mod handlers;
pub mod server_state;
pub mod tcp;
pub mod versand;

// Bequeme Re-Exporte
pub use connection::ClientVerbindung;
pub use dispatcher::{DispatchAusgang, FrameDispatcher, Identitaet, VerbindungsKontext};
pub use server_state::{GatewayConfig, GatewayState};
pub use tcp::GatewayServer;
pub use versand::{VerbindungsSenke, VersandAuftrag};
