//! Entitaeten der Kundendienst-Registry
//!
//! Alle Typen sind reine Daten-Records; die Konsistenzregeln zwischen ihnen
//! setzt ausschliesslich der `KundendienstService` durch. Lookups geben
//! Schnappschuesse (Clones) zurueck – eine Referenz in die Registry verlaesst
//! nie den Lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprechstunde_core::senke::SenkenHandle;
use sprechstunde_core::types::{
    BenutzerId, GruppenId, MitarbeiterId, NachrichtenId, SitzungsId, TeilnehmerId,
};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Status-Enums
// ---------------------------------------------------------------------------

/// Online-Status eines Teilnehmers (Benutzer oder Mitarbeiter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineStatus {
    Offline,
    Online,
    /// Nur fuer Benutzer: aktuell in einer aktiven Sitzung
    InSitzung,
}

/// Status einer Sitzung
///
/// `Wartend` ist reserviert – der Erstellungspfad geht direkt nach `Aktiv`.
/// `Geschlossen` ist terminal: die Routing-Felder einer geschlossenen
/// Sitzung werden nie wieder veraendert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SitzungsStatus {
    Wartend,
    Aktiv,
    Geschlossen,
}

/// Nachrichtentyp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NachrichtenTyp {
    Text,
    Bild,
    System,
}

// ---------------------------------------------------------------------------
// Entitaeten
// ---------------------------------------------------------------------------

/// Ein verbundener Endkunde
///
/// Wird beim Verbindungsaufbau angelegt und beim Trennen entfernt. Haelt
/// hoechstens einen Zeiger auf seine aktive Sitzung.
#[derive(Debug, Clone)]
pub struct Benutzer {
    pub id: BenutzerId,
    pub name: String,
    pub status: OnlineStatus,
    /// Ausgehender Kanal der aktiven Verbindung
    pub senke: SenkenHandle,
    pub created_at: DateTime<Utc>,
    /// Aktive Sitzung, falls vorhanden
    pub session_id: Option<SitzungsId>,
}

/// Ein verbundener Kundendienst-Mitarbeiter
///
/// Gehoert genau einer Gruppe an und kann mehrere Sitzungen gleichzeitig
/// betreuen.
#[derive(Debug, Clone)]
pub struct Mitarbeiter {
    pub id: MitarbeiterId,
    pub name: String,
    pub group_id: GruppenId,
    pub status: OnlineStatus,
    /// Ausgehender Kanal der aktiven Verbindung
    pub senke: SenkenHandle,
    /// Sitzungen die dieser Mitarbeiter aktuell betreut
    pub sessions: HashSet<SitzungsId>,
}

/// Eine Kundendienst-Gruppe
///
/// Haelt nur die Mitgliedschaft – die Lebensdauer der Mitarbeiter ist
/// unabhaengig von der Gruppe.
#[derive(Debug, Clone)]
pub struct MitarbeiterGruppe {
    pub id: GruppenId,
    pub name: String,
    pub members: HashSet<MitarbeiterId>,
}

/// Eine Sitzung zwischen genau einem Benutzer und einem Mitarbeiter
///
/// Der Mitarbeiter kann per Uebergabe wechseln, der Benutzer nie. Der
/// Nachrichtenverlauf ist append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Sitzung {
    pub id: SitzungsId,
    pub user_id: BenutzerId,
    pub staff_id: MitarbeiterId,
    pub status: SitzungsStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatNachricht>,
}

/// Eine Nachricht innerhalb einer Sitzung – unveraenderlich nach Erstellung
#[derive(Debug, Clone, Serialize)]
pub struct ChatNachricht {
    pub id: NachrichtenId,
    pub session_id: SitzungsId,
    pub from_id: TeilnehmerId,
    /// Aufgeloester Empfaenger: die jeweils andere Seite der Sitzung
    pub to_id: TeilnehmerId,
    pub content: String,
    pub message_type: NachrichtenTyp,
    pub created_at: DateTime<Utc>,
}

/// Ergebnis einer Sitzungs-Uebergabe
///
/// Traegt alle IDs die das Gateway fuer die Benachrichtigung der drei
/// beteiligten Parteien braucht.
#[derive(Debug, Clone)]
pub struct SitzungsUebergabe {
    pub session_id: SitzungsId,
    pub user_id: BenutzerId,
    pub old_staff_id: MitarbeiterId,
    pub new_staff_id: MitarbeiterId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_enums_serialisieren_snake_case() {
        assert_eq!(serde_json::to_string(&SitzungsStatus::Geschlossen).unwrap(), "\"geschlossen\"");
        assert_eq!(serde_json::to_string(&OnlineStatus::InSitzung).unwrap(), "\"in_sitzung\"");
        assert_eq!(serde_json::to_string(&NachrichtenTyp::Bild).unwrap(), "\"bild\"");
    }

    #[test]
    fn nachricht_serialisiert_ihre_felder() {
        let nachricht = ChatNachricht {
            id: NachrichtenId::neu("u1_s1_1_1"),
            session_id: SitzungsId::neu("u1_s1_1"),
            from_id: TeilnehmerId::neu("u1"),
            to_id: TeilnehmerId::neu("s1"),
            content: "hallo".into(),
            message_type: NachrichtenTyp::Text,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let wert: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&nachricht).unwrap()).unwrap();
        assert_eq!(wert["session_id"], "u1_s1_1");
        assert_eq!(wert["to_id"], "s1");
        assert_eq!(wert["message_type"], "text");
    }
}
