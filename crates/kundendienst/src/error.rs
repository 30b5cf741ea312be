//! Fehlertypen fuer die Kundendienst-Registry
//!
//! Alle Varianten sind fachlich und nicht-fatal: der Aufrufer (das Gateway)
//! verwirft den ausloesenden Frame und setzt die Verbindung fort.

use thiserror::Error;

/// Fachliche Fehler der Registry
#[derive(Debug, Error)]
pub enum KundendienstError {
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Mitarbeiter nicht gefunden: {0}")]
    MitarbeiterNichtGefunden(String),

    #[error("Gruppe nicht gefunden: {0}")]
    GruppeNichtGefunden(String),

    #[error("Sitzung nicht gefunden: {0}")]
    SitzungNichtGefunden(String),

    #[error("Ungueltige Operation: {0}")]
    UngueltigeOperation(String),
}

/// Result-Typ fuer Registry-Operationen
pub type KundendienstResult<T> = Result<T, KundendienstError>;
