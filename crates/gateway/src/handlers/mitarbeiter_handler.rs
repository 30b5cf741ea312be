//! Mitarbeiter-Handler – Frames von Kundendienst-Verbindungen
//!
//! Mitarbeiter ziehen Benutzer in Sitzungen (`connect_user`), uebergeben
//! Sitzungen an Kollegen (`transfer_session`) und senden Nachrichten in
//! eine benannte Sitzung.

use sprechstunde_core::types::{BenutzerId, MitarbeiterId, TeilnehmerId};
use sprechstunde_protocol::frames::{
    AusgehendesFrame, ConnectUserAnfrage, NachrichtAnfrage, SitzungsUebergabeInfo,
    TransferSessionAnfrage,
};
use sprechstunde_kundendienst::NachrichtenTyp;
use std::sync::Arc;

use crate::handlers::{frame_zustellen, nachricht_info, sitzung_info};
use crate::server_state::GatewayState;

/// Verarbeitet `connect_user`: erstellt eine Sitzung mit dem Benutzer
///
/// Bei Erfolg bekommen BEIDE Seiten eine `session_created`-Benachrichtigung.
pub fn handle_connect_user(
    anfrage: ConnectUserAnfrage,
    mitarbeiter_id: &MitarbeiterId,
    state: &Arc<GatewayState>,
) {
    match state.dienst.sitzung_erstellen(&anfrage.user_id, mitarbeiter_id) {
        Ok(sitzung) => {
            let frame = AusgehendesFrame::SessionCreated(sitzung_info(&sitzung));

            if let Some(benutzer) = state.dienst.benutzer(&sitzung.user_id) {
                frame_zustellen(&benutzer.senke, &frame);
            }
            if let Some(mitarbeiter) = state.dienst.mitarbeiter(mitarbeiter_id) {
                frame_zustellen(&mitarbeiter.senke, &frame);
            }

            tracing::debug!(
                mitarbeiter = %mitarbeiter_id,
                sitzung = %sitzung.id,
                "Sitzung erstellt und beide Seiten benachrichtigt"
            );
        }
        Err(fehler) => {
            tracing::warn!(
                mitarbeiter = %mitarbeiter_id,
                benutzer = %anfrage.user_id,
                fehler = %fehler,
                "connect_user verworfen"
            );
        }
    }
}

/// Verarbeitet `transfer_session`: uebergibt eine Sitzung an einen Kollegen
///
/// Bei Erfolg werden Benutzer, abgebender und uebernehmender Mitarbeiter
/// benachrichtigt – best-effort: wer gerade nicht verbunden ist, wird
/// stillschweigend uebersprungen.
pub fn handle_transfer_session(
    anfrage: TransferSessionAnfrage,
    mitarbeiter_id: &MitarbeiterId,
    state: &Arc<GatewayState>,
) {
    match state
        .dienst
        .sitzung_uebergeben(&anfrage.session_id, &anfrage.new_staff_id)
    {
        Ok(uebergabe) => {
            let frame = AusgehendesFrame::SessionTransferred(SitzungsUebergabeInfo {
                session_id: uebergabe.session_id.clone(),
                old_staff_id: uebergabe.old_staff_id.clone(),
                new_staff_id: uebergabe.new_staff_id.clone(),
            });

            if let Some(benutzer) = state.dienst.benutzer(&uebergabe.user_id) {
                frame_zustellen(&benutzer.senke, &frame);
            }
            if let Some(alter) = state.dienst.mitarbeiter(&uebergabe.old_staff_id) {
                frame_zustellen(&alter.senke, &frame);
            }
            if let Some(neuer) = state.dienst.mitarbeiter(&uebergabe.new_staff_id) {
                frame_zustellen(&neuer.senke, &frame);
            }

            tracing::debug!(
                mitarbeiter = %mitarbeiter_id,
                sitzung = %uebergabe.session_id,
                an = %uebergabe.new_staff_id,
                "Sitzung uebergeben und Beteiligte benachrichtigt"
            );
        }
        Err(fehler) => {
            tracing::warn!(
                mitarbeiter = %mitarbeiter_id,
                sitzung = %anfrage.session_id,
                fehler = %fehler,
                "transfer_session verworfen"
            );
        }
    }
}

/// Verarbeitet eine Nachricht eines Mitarbeiters
///
/// Anders als beim Benutzer kommt die Sitzung aus dem Payload – ein
/// Mitarbeiter betreut mehrere Sitzungen gleichzeitig. Ohne `session_id`
/// wird der Frame verworfen.
pub fn handle_nachricht(
    anfrage: NachrichtAnfrage,
    mitarbeiter_id: &MitarbeiterId,
    state: &Arc<GatewayState>,
) {
    let session_id = match anfrage.session_id {
        Some(id) => id,
        None => {
            tracing::debug!(mitarbeiter = %mitarbeiter_id, "Nachricht ohne session_id verworfen");
            return;
        }
    };

    let absender = TeilnehmerId::from(mitarbeiter_id.clone());
    match state
        .dienst
        .nachricht_senden(&session_id, &absender, anfrage.content, NachrichtenTyp::Text)
    {
        Ok(nachricht) => {
            let empfaenger_id = BenutzerId::neu(nachricht.to_id.as_str());
            if let Some(benutzer) = state.dienst.benutzer(&empfaenger_id) {
                frame_zustellen(
                    &benutzer.senke,
                    &AusgehendesFrame::Message(nachricht_info(&nachricht)),
                );
            }
            tracing::debug!(
                mitarbeiter = %mitarbeiter_id,
                sitzung = %session_id,
                "Mitarbeiter-Nachricht weitergeleitet"
            );
        }
        Err(fehler) => {
            tracing::warn!(
                mitarbeiter = %mitarbeiter_id,
                sitzung = %session_id,
                fehler = %fehler,
                "Mitarbeiter-Nachricht verworfen"
            );
        }
    }
}
