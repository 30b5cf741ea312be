//! sprechstunde-protocol – Protokoll-Definitionen fuer das Chat-Relay
//!
//! Dieses Crate definiert:
//! - die Frame-Typen des Gateway-Protokolls (`frames`): JSON-Objekte der
//!   Form `{ "type": ..., "payload": ... }`, getrennt nach Richtung
//! - das Wire-Format (`wire`): laengen-praefigierte Frames fuer TCP
//!
//! Die Frames sind reine Draht-Typen; die Domaenen-Typen der Registry
//! werden im Gateway in ihre Draht-Gestalt konvertiert.

pub mod frames;
pub mod wire;

// Bequeme Re-Exporte
pub use frames::{AusgehendesFrame, EingehendesFrame};
pub use wire::FrameCodec;
