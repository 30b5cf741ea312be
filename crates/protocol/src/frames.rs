//! Frame-Definitionen des Gateway-Protokolls
//!
//! Jeder Frame ist ein JSON-Objekt `{ "type": string, "payload": ... }`.
//! Die Tagged Enums bilden diesen Umschlag direkt ab (adjacently tagged via
//! serde), damit Frame-Typen zur Compilezeit vollstaendig sind.
//!
//! ## Richtungen
//! - Client -> Gateway: `login_user`, `login_staff`, `connect_user`,
//!   `transfer_session`, `message`, `pong`
//! - Gateway -> Client: `session_created`, `session_transferred`, `message`,
//!   `ping`
//!
//! `message` existiert in beiden Richtungen mit unterschiedlichem Payload,
//! deshalb gibt es zwei getrennte Enums statt eines gemeinsamen.

use serde::{Deserialize, Serialize};
use sprechstunde_core::types::{
    BenutzerId, GruppenId, MitarbeiterId, NachrichtenId, SitzungsId, TeilnehmerId,
};

// ---------------------------------------------------------------------------
// Eingehende Payloads (Client -> Gateway)
// ---------------------------------------------------------------------------

/// Handshake eines Endkunden – muss der erste Frame der Verbindung sein
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUserAnfrage {
    pub user_id: BenutzerId,
    /// Anzeigename
    pub name: String,
}

/// Handshake eines Mitarbeiters – muss der erste Frame der Verbindung sein
///
/// Schlaegt fehl (Verbindung wird geschlossen) wenn die Gruppe nicht existiert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStaffAnfrage {
    pub staff_id: MitarbeiterId,
    /// Anzeigename
    pub name: String,
    pub group_id: GruppenId,
}

/// Mitarbeiter zieht einen verbundenen Benutzer in eine neue Sitzung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectUserAnfrage {
    pub user_id: BenutzerId,
}

/// Mitarbeiter uebergibt eine Sitzung an einen Kollegen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSessionAnfrage {
    pub session_id: SitzungsId,
    pub new_staff_id: MitarbeiterId,
}

/// Text-Nachricht in einer Sitzung
///
/// Fuer Benutzer wird `session_id` zwar akzeptiert, aber ignoriert – die
/// aktive Sitzung wird aus dem eigenen Registry-Zustand aufgeloest, nicht
/// aus dem Payload. Mitarbeiter muessen die Sitzung benennen, weil sie
/// mehrere gleichzeitig betreuen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtAnfrage {
    #[serde(default)]
    pub session_id: Option<SitzungsId>,
    pub content: String,
}

/// Keepalive-Antwort des Clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongNachricht {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Ausgehende Payloads (Gateway -> Client)
// ---------------------------------------------------------------------------

/// Draht-Gestalt einer Sitzung (inklusive Nachrichtenverlauf)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitzungInfo {
    pub id: SitzungsId,
    pub user_id: BenutzerId,
    pub staff_id: MitarbeiterId,
    /// "waiting", "active" oder "closed"
    pub status: String,
    /// RFC-3339-Zeitstempel
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<NachrichtInfo>,
}

/// Draht-Gestalt einer Nachricht
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtInfo {
    pub id: NachrichtenId,
    pub session_id: SitzungsId,
    pub from_id: TeilnehmerId,
    pub to_id: TeilnehmerId,
    pub content: String,
    /// "text", "image" oder "system"
    pub message_type: String,
    /// RFC-3339-Zeitstempel
    pub created_at: String,
}

/// Benachrichtigung ueber eine uebergebene Sitzung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitzungsUebergabeInfo {
    pub session_id: SitzungsId,
    pub old_staff_id: MitarbeiterId,
    pub new_staff_id: MitarbeiterId,
}

/// Keepalive-Ping des Gateways
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingNachricht {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Frame-Enums
// ---------------------------------------------------------------------------

/// Alle Frames vom Client an das Gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EingehendesFrame {
    LoginUser(LoginUserAnfrage),
    LoginStaff(LoginStaffAnfrage),
    ConnectUser(ConnectUserAnfrage),
    TransferSession(TransferSessionAnfrage),
    Message(NachrichtAnfrage),
    Pong(PongNachricht),
}

impl EingehendesFrame {
    /// Deserialisiert einen Frame aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialisiert den Frame als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Alle Frames vom Gateway an den Client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AusgehendesFrame {
    SessionCreated(SitzungInfo),
    SessionTransferred(SitzungsUebergabeInfo),
    Message(NachrichtInfo),
    Ping(PingNachricht),
}

impl AusgehendesFrame {
    /// Deserialisiert einen Frame aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialisiert den Frame als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Erstellt einen Ping-Frame
    pub fn ping(timestamp_ms: u64) -> Self {
        Self::Ping(PingNachricht { timestamp_ms })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
