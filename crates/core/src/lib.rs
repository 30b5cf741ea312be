//! sprechstunde-core – Gemeinsame Typen und Traits
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Sprechstunde-Crates gemeinsam genutzt werden: die typisierten
//! IDs und die `Senke`-Schnittstelle zur Transportschicht.

pub mod senke;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use senke::{Senke, SenkenHandle};
pub use types::{BenutzerId, GruppenId, MitarbeiterId, NachrichtenId, SitzungsId, TeilnehmerId};
