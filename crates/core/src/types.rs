//! Gemeinsame Identifikationstypen fuer Sprechstunde
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Die IDs sind
//! opake Strings: Benutzer-, Mitarbeiter- und Gruppen-IDs bringt der Client
//! beim Verbindungsaufbau mit, Sitzungs- und Nachrichten-IDs leitet die
//! Registry ab. Auf dem Draht serialisieren alle IDs als einfacher String.

use serde::{Deserialize, Serialize};

/// Eindeutige Benutzer-ID (Endkunde)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenutzerId(pub String);

impl BenutzerId {
    /// Erstellt eine BenutzerId aus einem opaken String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BenutzerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "benutzer:{}", self.0)
    }
}

/// Eindeutige Mitarbeiter-ID (Kundendienst)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MitarbeiterId(pub String);

impl MitarbeiterId {
    /// Erstellt eine MitarbeiterId aus einem opaken String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MitarbeiterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mitarbeiter:{}", self.0)
    }
}

/// Eindeutige Gruppen-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GruppenId(pub String);

impl GruppenId {
    /// Erstellt eine GruppenId aus einem opaken String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GruppenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gruppe:{}", self.0)
    }
}

/// Eindeutige Sitzungs-ID
///
/// Wird von der Registry abgeleitet (`<benutzer>_<mitarbeiter>_<laufnummer>`)
/// und fuer die Prozess-Lebensdauer nie wiederverwendet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SitzungsId(pub String);

impl SitzungsId {
    /// Erstellt eine SitzungsId aus einem abgeleiteten String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SitzungsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sitzung:{}", self.0)
    }
}

/// Eindeutige Nachrichten-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NachrichtenId(pub String);

impl NachrichtenId {
    /// Erstellt eine NachrichtenId aus einem abgeleiteten String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NachrichtenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nachricht:{}", self.0)
    }
}

/// ID eines Sitzungs-Teilnehmers – entweder ein Benutzer oder ein Mitarbeiter
///
/// Nachrichten tragen Absender und Empfaenger als TeilnehmerId, weil beide
/// Seiten einer Sitzung senden und empfangen koennen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeilnehmerId(pub String);

impl TeilnehmerId {
    /// Erstellt eine TeilnehmerId aus einem opaken String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<BenutzerId> for TeilnehmerId {
    fn from(id: BenutzerId) -> Self {
        Self(id.0)
    }
}

impl From<MitarbeiterId> for TeilnehmerId {
    fn from(id: MitarbeiterId) -> Self {
        Self(id.0)
    }
}

impl std::fmt::Display for TeilnehmerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "teilnehmer:{}", self.0)
    }
}
