//! sprechstunde-kundendienst – Sitzungs- und Verbindungs-Registry
//!
//! Dieses Crate implementiert den Kern des Chat-Relays:
//! - Entitaeten: Benutzer, Mitarbeiter, MitarbeiterGruppe, Sitzung,
//!   ChatNachricht samt Status-Enums
//! - `KundendienstService`: die autoritative In-Memory-Registry mit
//!   atomaren Operationen ueber alle vier Tabellen
//! - Sitzungs-Lebenszyklus: Erstellen, Uebergabe an Kollegen,
//!   kaskadierendes Schliessen beim Trennen eines Mitarbeiters
//!
//! Der gesamte Zustand ist fluechtig und lebt nur fuer die Dauer des
//! Prozesses; es gibt keine Persistenz.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{KundendienstError, KundendienstResult};
pub use service::KundendienstService;
pub use types::{
    Benutzer, ChatNachricht, Mitarbeiter, MitarbeiterGruppe, NachrichtenTyp, OnlineStatus,
    Sitzung, SitzungsStatus, SitzungsUebergabe,
};
