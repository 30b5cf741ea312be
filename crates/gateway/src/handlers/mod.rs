//! Frame-Handler – fachliche Verarbeitung eingehender Frames
//!
//! Jeder Handler ruft genau eine Registry-Operation auf und stellt das
//! Ergebnis anhand des zurueckgegebenen Schnappschusses zu – die Zustellung
//! passiert damit immer NACH der Lock-Freigabe. Fehlgeschlagene Frames
//! werden geloggt und verworfen, nie an den Absender gespiegelt.

pub mod benutzer_handler;
pub mod mitarbeiter_handler;

use sprechstunde_core::senke::SenkenHandle;
use sprechstunde_kundendienst::{ChatNachricht, NachrichtenTyp, Sitzung, SitzungsStatus};
use sprechstunde_protocol::frames::{AusgehendesFrame, NachrichtInfo, SitzungInfo};

// ---------------------------------------------------------------------------
// Konvertierung Domaene -> Draht
// ---------------------------------------------------------------------------

fn sitzungs_status_str(status: SitzungsStatus) -> &'static str {
    match status {
        SitzungsStatus::Wartend => "waiting",
        SitzungsStatus::Aktiv => "active",
        SitzungsStatus::Geschlossen => "closed",
    }
}

fn nachrichten_typ_str(typ: NachrichtenTyp) -> &'static str {
    match typ {
        NachrichtenTyp::Text => "text",
        NachrichtenTyp::Bild => "image",
        NachrichtenTyp::System => "system",
    }
}

/// Draht-Gestalt einer Nachricht
pub(crate) fn nachricht_info(nachricht: &ChatNachricht) -> NachrichtInfo {
    NachrichtInfo {
        id: nachricht.id.clone(),
        session_id: nachricht.session_id.clone(),
        from_id: nachricht.from_id.clone(),
        to_id: nachricht.to_id.clone(),
        content: nachricht.content.clone(),
        message_type: nachrichten_typ_str(nachricht.message_type).to_string(),
        created_at: nachricht.created_at.to_rfc3339(),
    }
}

/// Draht-Gestalt einer Sitzung (inklusive Verlauf)
pub(crate) fn sitzung_info(sitzung: &Sitzung) -> SitzungInfo {
    SitzungInfo {
        id: sitzung.id.clone(),
        user_id: sitzung.user_id.clone(),
        staff_id: sitzung.staff_id.clone(),
        status: sitzungs_status_str(sitzung.status).to_string(),
        created_at: sitzung.created_at.to_rfc3339(),
        updated_at: sitzung.updated_at.to_rfc3339(),
        messages: sitzung.messages.iter().map(nachricht_info).collect(),
    }
}

/// Serialisiert einen Frame und reiht ihn in die Senke ein
///
/// Gibt `false` zurueck wenn der Empfaenger den Frame nicht annehmen
/// konnte (Queue voll oder Verbindung beendet).
pub(crate) fn frame_zustellen(senke: &SenkenHandle, frame: &AusgehendesFrame) -> bool {
    match frame.to_json() {
        Ok(json) => senke.senden(json.into_bytes()),
        Err(fehler) => {
            tracing::error!(fehler = %fehler, "Frame-Serialisierung fehlgeschlagen");
            false
        }
    }
}
