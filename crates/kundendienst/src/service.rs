//! KundendienstService – die autoritative Registry des Chat-Relays
//!
//! Der Service haelt die vier Tabellen (Benutzer, Mitarbeiter, Gruppen,
//! Sitzungen) hinter einem einzigen Reader-Writer-Lock. Mutierende
//! Operationen nehmen den exklusiven Lock ueber die gesamte Registry,
//! reine Lookups den geteilten – ein Lock pro Tabelle wuerde die
//! tabellenuebergreifenden Invarianten brechen (Sitzungszeiger des
//! Benutzers, Sitzungs-Set des Mitarbeiters, Gruppen-Mitgliedschaft).
//!
//! Alle Operationen sind synchron und suspendieren nie. Sie geben
//! Schnappschuesse (Clones) zurueck; ausgehende Zustellung passiert im
//! Gateway NACH der Lock-Freigabe anhand dieser Schnappschuesse.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sprechstunde_core::senke::SenkenHandle;
use sprechstunde_core::types::{BenutzerId, GruppenId, MitarbeiterId, NachrichtenId, SitzungsId, TeilnehmerId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{KundendienstError, KundendienstResult};
use crate::types::{
    Benutzer, ChatNachricht, Mitarbeiter, MitarbeiterGruppe, NachrichtenTyp, OnlineStatus,
    Sitzung, SitzungsStatus, SitzungsUebergabe,
};

// ---------------------------------------------------------------------------
// MonotoneUhr
// ---------------------------------------------------------------------------

/// Streng monoton steigende Uhr fuer Registry-Zeitstempel
///
/// `Utc::now()` kann bei schnell aufeinanderfolgenden Aufrufen denselben
/// Wert liefern; die Registry braucht aber streng steigende Stempel, damit
/// die Reihenfolge der Operationen an `updated_at` ablesbar bleibt. Faellt
/// die Systemuhr nicht vorwaerts, wird der letzte Stempel um eine
/// Mikrosekunde erhoeht.
#[derive(Debug)]
struct MonotoneUhr {
    letzter: DateTime<Utc>,
}

impl MonotoneUhr {
    fn neu() -> Self {
        Self {
            letzter: DateTime::<Utc>::MIN_UTC,
        }
    }

    fn jetzt(&mut self) -> DateTime<Utc> {
        let mut stempel = Utc::now();
        if stempel <= self.letzter {
            stempel = self.letzter + Duration::microseconds(1);
        }
        self.letzter = stempel;
        stempel
    }
}

// ---------------------------------------------------------------------------
// KundendienstService
// ---------------------------------------------------------------------------

/// Innerer Zustand – alle vier Tabellen unter EINEM Lock
struct KundendienstInnen {
    benutzer: HashMap<BenutzerId, Benutzer>,
    mitarbeiter: HashMap<MitarbeiterId, Mitarbeiter>,
    gruppen: HashMap<GruppenId, MitarbeiterGruppe>,
    sitzungen: HashMap<SitzungsId, Sitzung>,
    /// Laufnummer fuer Sitzungs-IDs – prozessweit eindeutig, nie wiederverwendet
    sitzungs_laufnummer: u64,
    /// Laufnummer fuer Nachrichten-IDs
    nachrichten_laufnummer: u64,
    uhr: MonotoneUhr,
}

/// Die Verbindungs- und Sitzungs-Registry
///
/// Thread-safe via Arc + RwLock. Clone des Arcs teilt den inneren Zustand.
pub struct KundendienstService {
    innen: RwLock<KundendienstInnen>,
}

impl KundendienstService {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Arc<Self> {
        Arc::new(Self {
            innen: RwLock::new(KundendienstInnen {
                benutzer: HashMap::new(),
                mitarbeiter: HashMap::new(),
                gruppen: HashMap::new(),
                sitzungen: HashMap::new(),
                sitzungs_laufnummer: 0,
                nachrichten_laufnummer: 0,
                uhr: MonotoneUhr::neu(),
            }),
        })
    }

    // -----------------------------------------------------------------------
    // Verbinden & Trennen
    // -----------------------------------------------------------------------

    /// Registriert einen Benutzer als verbunden
    ///
    /// Eine bestehende Registrierung mit derselben ID wird kommentarlos
    /// ersetzt; die alte Senke wird dabei NICHT geschlossen. Aufrufer
    /// duerfen sich nicht auf Kollisionserkennung verlassen.
    pub fn benutzer_verbinden(
        &self,
        id: BenutzerId,
        name: impl Into<String>,
        senke: SenkenHandle,
    ) -> Benutzer {
        let mut guard = self.innen.write();
        let innen = &mut *guard;

        let benutzer = Benutzer {
            id: id.clone(),
            name: name.into(),
            status: OnlineStatus::Online,
            senke,
            created_at: innen.uhr.jetzt(),
            session_id: None,
        };
        innen.benutzer.insert(id.clone(), benutzer.clone());

        tracing::info!(benutzer = %id, "Benutzer verbunden");
        benutzer
    }

    /// Registriert einen Mitarbeiter als verbunden
    ///
    /// Die Gruppe muss bereits existieren; der Mitarbeiter wird in die
    /// Mitarbeiter-Tabelle UND in die Mitglieder-Liste der Gruppe
    /// eingetragen, mit leerem Sitzungs-Set.
    pub fn mitarbeiter_verbinden(
        &self,
        id: MitarbeiterId,
        name: impl Into<String>,
        group_id: GruppenId,
        senke: SenkenHandle,
    ) -> KundendienstResult<Mitarbeiter> {
        let mut guard = self.innen.write();
        let innen = &mut *guard;

        if !innen.gruppen.contains_key(&group_id) {
            return Err(KundendienstError::GruppeNichtGefunden(group_id.0));
        }

        let mitarbeiter = Mitarbeiter {
            id: id.clone(),
            name: name.into(),
            group_id: group_id.clone(),
            status: OnlineStatus::Online,
            senke,
            sessions: HashSet::new(),
        };
        innen.mitarbeiter.insert(id.clone(), mitarbeiter.clone());
        if let Some(gruppe) = innen.gruppen.get_mut(&group_id) {
            gruppe.members.insert(id.clone());
        }

        tracing::info!(mitarbeiter = %id, gruppe = %group_id, "Mitarbeiter verbunden");
        Ok(mitarbeiter)
    }

    /// Registriert eine Kundendienst-Gruppe
    ///
    /// Idempotent: eine erneute Registrierung unter derselben ID ersetzt die
    /// Gruppe mitsamt leerer Mitglieder-Liste.
    pub fn gruppe_erstellen(&self, id: GruppenId, name: impl Into<String>) -> MitarbeiterGruppe {
        let mut guard = self.innen.write();

        let gruppe = MitarbeiterGruppe {
            id: id.clone(),
            name: name.into(),
            members: HashSet::new(),
        };
        guard.gruppen.insert(id.clone(), gruppe.clone());

        tracing::info!(gruppe = %id, "Gruppe registriert");
        gruppe
    }

    /// Trennt einen Benutzer
    ///
    /// No-op fuer unbekannte IDs. Die Senke wird geschlossen und der Eintrag
    /// entfernt; eine Sitzung an der der Benutzer beteiligt war bleibt
    /// unberuehrt bestehen (der Benutzer kann sich neu verbinden und sie
    /// wieder aufnehmen).
    pub fn benutzer_trennen(&self, id: &BenutzerId) {
        let mut guard = self.innen.write();

        if let Some(mut benutzer) = guard.benutzer.remove(id) {
            benutzer.status = OnlineStatus::Offline;
            benutzer.senke.schliessen();
            tracing::info!(benutzer = %id, "Benutzer getrennt");
        }
    }

    /// Trennt einen Mitarbeiter
    ///
    /// No-op fuer unbekannte IDs. Entfernt den Mitarbeiter aus seiner Gruppe
    /// und ueberfuehrt jede noch zugeordnete Sitzung nach `Geschlossen` –
    /// dies ist der einzige Pfad der Sitzungen aktiv schliesst. Die
    /// Benutzer-Seite der Sitzungen bleibt unveraendert.
    pub fn mitarbeiter_trennen(&self, id: &MitarbeiterId) {
        let mut guard = self.innen.write();
        let innen = &mut *guard;

        if let Some(mut mitarbeiter) = innen.mitarbeiter.remove(id) {
            mitarbeiter.status = OnlineStatus::Offline;
            mitarbeiter.senke.schliessen();

            if let Some(gruppe) = innen.gruppen.get_mut(&mitarbeiter.group_id) {
                gruppe.members.remove(id);
            }

            for session_id in &mitarbeiter.sessions {
                let stempel = innen.uhr.jetzt();
                if let Some(sitzung) = innen.sitzungen.get_mut(session_id) {
                    sitzung.status = SitzungsStatus::Geschlossen;
                    sitzung.updated_at = stempel;
                }
            }

            tracing::info!(
                mitarbeiter = %id,
                geschlossene_sitzungen = mitarbeiter.sessions.len(),
                "Mitarbeiter getrennt"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Sitzungs-Lebenszyklus
    // -----------------------------------------------------------------------

    /// Erstellt eine neue Sitzung zwischen einem Benutzer und einem Mitarbeiter
    ///
    /// Beide Seiten muessen aktuell verbunden sein. Die Sitzung startet
    /// direkt im Status `Aktiv`, wird in die Sitzungs-Tabelle und in das
    /// Sitzungs-Set des Mitarbeiters eingetragen, und der Benutzer erhaelt
    /// Sitzungszeiger und Status `InSitzung`.
    pub fn sitzung_erstellen(
        &self,
        user_id: &BenutzerId,
        staff_id: &MitarbeiterId,
    ) -> KundendienstResult<Sitzung> {
        let mut guard = self.innen.write();
        let innen = &mut *guard;

        if !innen.benutzer.contains_key(user_id) {
            return Err(KundendienstError::BenutzerNichtGefunden(user_id.0.clone()));
        }
        let mitarbeiter = match innen.mitarbeiter.get_mut(staff_id) {
            Some(m) => m,
            None => {
                return Err(KundendienstError::MitarbeiterNichtGefunden(
                    staff_id.0.clone(),
                ))
            }
        };

        // Laufnummer statt Zeitstempel: eindeutig auch wenn dasselbe Paar
        // innerhalb eines Uhr-Ticks mehrfach verbunden wird, und trotzdem
        // menschenlesbar ableitbar.
        innen.sitzungs_laufnummer += 1;
        let id = SitzungsId::neu(format!(
            "{}_{}_{}",
            user_id.as_str(),
            staff_id.as_str(),
            innen.sitzungs_laufnummer
        ));
        let stempel = innen.uhr.jetzt();

        let sitzung = Sitzung {
            id: id.clone(),
            user_id: user_id.clone(),
            staff_id: staff_id.clone(),
            status: SitzungsStatus::Aktiv,
            created_at: stempel,
            updated_at: stempel,
            messages: Vec::new(),
        };

        mitarbeiter.sessions.insert(id.clone());
        innen.sitzungen.insert(id.clone(), sitzung.clone());
        if let Some(benutzer) = innen.benutzer.get_mut(user_id) {
            benutzer.session_id = Some(id.clone());
            benutzer.status = OnlineStatus::InSitzung;
        }

        tracing::info!(sitzung = %id, benutzer = %user_id, mitarbeiter = %staff_id, "Sitzung erstellt");
        Ok(sitzung)
    }

    /// Uebergibt eine Sitzung an einen anderen Mitarbeiter
    ///
    /// Sitzung und Ziel-Mitarbeiter muessen existieren. Auch der ABGEBENDE
    /// Mitarbeiter muss noch verbunden sein – die Sitzung muss aus seinem
    /// Set entfernt werden, sein Fehlen ist ein Fehler und wird nicht still
    /// uebergangen. Der Benutzer und der Nachrichtenverlauf bleiben
    /// unveraendert.
    pub fn sitzung_uebergeben(
        &self,
        session_id: &SitzungsId,
        neuer_staff_id: &MitarbeiterId,
    ) -> KundendienstResult<SitzungsUebergabe> {
        let mut guard = self.innen.write();
        let innen = &mut *guard;

        let (user_id, alter_staff_id, status) = match innen.sitzungen.get(session_id) {
            Some(s) => (s.user_id.clone(), s.staff_id.clone(), s.status),
            None => {
                return Err(KundendienstError::SitzungNichtGefunden(
                    session_id.0.clone(),
                ))
            }
        };

        if !innen.mitarbeiter.contains_key(neuer_staff_id) {
            return Err(KundendienstError::MitarbeiterNichtGefunden(
                neuer_staff_id.0.clone(),
            ));
        }
        if !innen.mitarbeiter.contains_key(&alter_staff_id) {
            return Err(KundendienstError::MitarbeiterNichtGefunden(
                alter_staff_id.0.clone(),
            ));
        }

        // Geschlossen ist terminal: die Routing-Felder sind eingefroren.
        // Greift nur wenn der abgebende Mitarbeiter sich nach dem
        // kaskadierenden Schliessen unter derselben ID neu verbunden hat.
        if status == SitzungsStatus::Geschlossen {
            return Err(KundendienstError::UngueltigeOperation(format!(
                "Sitzung {} ist geschlossen und kann nicht uebergeben werden",
                session_id.as_str()
            )));
        }

        if let Some(alter) = innen.mitarbeiter.get_mut(&alter_staff_id) {
            alter.sessions.remove(session_id);
        }

        let stempel = innen.uhr.jetzt();
        if let Some(sitzung) = innen.sitzungen.get_mut(session_id) {
            sitzung.staff_id = neuer_staff_id.clone();
            sitzung.updated_at = stempel;
        }
        if let Some(neuer) = innen.mitarbeiter.get_mut(neuer_staff_id) {
            neuer.sessions.insert(session_id.clone());
        }

        tracing::info!(
            sitzung = %session_id,
            von = %alter_staff_id,
            an = %neuer_staff_id,
            "Sitzung uebergeben"
        );
        Ok(SitzungsUebergabe {
            session_id: session_id.clone(),
            user_id,
            old_staff_id: alter_staff_id,
            new_staff_id: neuer_staff_id.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Nachrichten
    // -----------------------------------------------------------------------

    /// Haengt eine Nachricht an eine Sitzung an
    ///
    /// Der Absender muss eine der beiden Seiten der Sitzung sein; der
    /// Empfaenger wird als die jeweils andere Seite aufgeloest. Dies ist der
    /// einzige Pfad der den Nachrichtenverlauf einer Sitzung veraendert.
    pub fn nachricht_senden(
        &self,
        session_id: &SitzungsId,
        from_id: &TeilnehmerId,
        content: impl Into<String>,
        message_type: NachrichtenTyp,
    ) -> KundendienstResult<ChatNachricht> {
        let mut guard = self.innen.write();
        let innen = &mut *guard;

        let sitzung = match innen.sitzungen.get_mut(session_id) {
            Some(s) => s,
            None => {
                return Err(KundendienstError::SitzungNichtGefunden(
                    session_id.0.clone(),
                ))
            }
        };

        let to_id = if from_id.as_str() == sitzung.user_id.as_str() {
            TeilnehmerId::from(sitzung.staff_id.clone())
        } else if from_id.as_str() == sitzung.staff_id.as_str() {
            TeilnehmerId::from(sitzung.user_id.clone())
        } else {
            return Err(KundendienstError::UngueltigeOperation(format!(
                "Absender {} ist kein Teilnehmer der Sitzung {}",
                from_id.as_str(),
                session_id.as_str()
            )));
        };

        innen.nachrichten_laufnummer += 1;
        let stempel = innen.uhr.jetzt();
        let nachricht = ChatNachricht {
            id: NachrichtenId::neu(format!(
                "{}_{}",
                session_id.as_str(),
                innen.nachrichten_laufnummer
            )),
            session_id: session_id.clone(),
            from_id: from_id.clone(),
            to_id,
            content: content.into(),
            message_type,
            created_at: stempel,
        };

        sitzung.messages.push(nachricht.clone());
        sitzung.updated_at = stempel;

        tracing::debug!(sitzung = %session_id, von = %from_id, "Nachricht angehaengt");
        Ok(nachricht)
    }

    // -----------------------------------------------------------------------
    // Lookups (geteilter Lock, geben Schnappschuesse zurueck)
    // -----------------------------------------------------------------------

    /// Gibt den Schnappschuss eines Benutzers zurueck
    pub fn benutzer(&self, id: &BenutzerId) -> Option<Benutzer> {
        self.innen.read().benutzer.get(id).cloned()
    }

    /// Gibt den Schnappschuss eines Mitarbeiters zurueck
    pub fn mitarbeiter(&self, id: &MitarbeiterId) -> Option<Mitarbeiter> {
        self.innen.read().mitarbeiter.get(id).cloned()
    }

    /// Gibt den Schnappschuss einer Gruppe zurueck
    pub fn gruppe(&self, id: &GruppenId) -> Option<MitarbeiterGruppe> {
        self.innen.read().gruppen.get(id).cloned()
    }

    /// Gibt den Schnappschuss einer Sitzung zurueck (inklusive Verlauf)
    pub fn sitzung(&self, id: &SitzungsId) -> Option<Sitzung> {
        self.innen.read().sitzungen.get(id).cloned()
    }

    /// Anzahl der verbundenen Benutzer
    pub fn benutzer_anzahl(&self) -> usize {
        self.innen.read().benutzer.len()
    }

    /// Anzahl der verbundenen Mitarbeiter
    pub fn mitarbeiter_anzahl(&self) -> usize {
        self.innen.read().mitarbeiter.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod uhr_tests {
    use super::MonotoneUhr;

    #[test]
    fn stempel_steigen_streng_monoton() {
        let mut uhr = MonotoneUhr::neu();
        let mut letzter = uhr.jetzt();
        for _ in 0..10_000 {
            let naechster = uhr.jetzt();
            assert!(naechster > letzter, "Stempel muss streng steigen");
            letzter = naechster;
        }
    }
}
