//! Benutzer-Handler – Frames von Endkunden-Verbindungen
//!
//! Benutzer koennen nur Nachrichten in ihre eigene aktive Sitzung senden.

use sprechstunde_core::types::{BenutzerId, MitarbeiterId, TeilnehmerId};
use sprechstunde_protocol::frames::{AusgehendesFrame, NachrichtAnfrage};
use sprechstunde_kundendienst::NachrichtenTyp;
use std::sync::Arc;

use crate::handlers::{frame_zustellen, nachricht_info};
use crate::server_state::GatewayState;

/// Verarbeitet eine Nachricht eines Benutzers
///
/// Die Sitzung wird aus dem eigenen Registry-Zustand aufgeloest – die
/// `session_id` im Payload wird fuer Benutzer grundsaetzlich nicht
/// vertraut. Ohne aktive Sitzung wird der Frame verworfen.
pub fn handle_nachricht(
    anfrage: NachrichtAnfrage,
    benutzer_id: &BenutzerId,
    state: &Arc<GatewayState>,
) {
    let benutzer = match state.dienst.benutzer(benutzer_id) {
        Some(b) => b,
        None => {
            tracing::warn!(benutzer = %benutzer_id, "Nachricht von unbekanntem Benutzer verworfen");
            return;
        }
    };
    let session_id = match benutzer.session_id {
        Some(id) => id,
        None => {
            tracing::debug!(benutzer = %benutzer_id, "Nachricht ohne aktive Sitzung verworfen");
            return;
        }
    };

    let absender = TeilnehmerId::from(benutzer_id.clone());
    match state
        .dienst
        .nachricht_senden(&session_id, &absender, anfrage.content, NachrichtenTyp::Text)
    {
        Ok(nachricht) => {
            // Zustellung an den betreuenden Mitarbeiter anhand des
            // Schnappschusses, der Registry-Lock ist hier laengst frei
            let empfaenger_id = MitarbeiterId::neu(nachricht.to_id.as_str());
            if let Some(mitarbeiter) = state.dienst.mitarbeiter(&empfaenger_id) {
                frame_zustellen(
                    &mitarbeiter.senke,
                    &AusgehendesFrame::Message(nachricht_info(&nachricht)),
                );
            }
            tracing::debug!(
                benutzer = %benutzer_id,
                sitzung = %session_id,
                "Benutzer-Nachricht weitergeleitet"
            );
        }
        Err(fehler) => {
            tracing::warn!(
                benutzer = %benutzer_id,
                sitzung = %session_id,
                fehler = %fehler,
                "Benutzer-Nachricht verworfen"
            );
        }
    }
}
