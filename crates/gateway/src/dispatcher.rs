//! Frame-Dispatcher – routet eingehende Frames an die richtigen Handler
//!
//! Der Dispatcher kennt die Rolle der Verbindung (Benutzer oder
//! Mitarbeiter) aus dem Login-Frame und leitet alle weiteren Frames an den
//! passenden Handler. Er ist bewusst synchron: Registry-Operationen
//! suspendieren nie und die Zustellung ist ein nicht-blockierendes
//! Einreihen, zwischen Dekodieren und Wirksamwerden eines Frames liegt
//! also kein await-Punkt.
//!
//! ## Zustandspruefung
//! - `login_user` / `login_staff` nur als erster Frame der Verbindung
//! - alle anderen Frames nur nach erfolgreichem Login, sonst verworfen

use sprechstunde_core::senke::SenkenHandle;
use sprechstunde_core::types::{BenutzerId, MitarbeiterId};
use sprechstunde_protocol::frames::EingehendesFrame;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handlers::{benutzer_handler, mitarbeiter_handler};
use crate::server_state::GatewayState;

/// Rolle und Identitaet einer angemeldeten Verbindung
#[derive(Debug, Clone)]
pub enum Identitaet {
    Benutzer(BenutzerId),
    Mitarbeiter(MitarbeiterId),
}

/// Kontext einer Verbindung – lebt so lange wie ihr Task
pub struct VerbindungsKontext {
    /// Peer-Adresse fuer Log-Ausgaben
    pub peer_addr: SocketAddr,
    /// Senke der eigenen Verbindung (wird beim Login in der Registry hinterlegt)
    pub senke: SenkenHandle,
    /// Identitaet nach erfolgreichem Login (None davor)
    pub identitaet: Option<Identitaet>,
}

/// Ergebnis eines Dispatch-Aufrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAusgang {
    /// Verbindung laeuft weiter
    Weiter,
    /// Verbindung soll beendet werden
    Trennen,
}

/// Zentraler Frame-Dispatcher
pub struct FrameDispatcher {
    state: Arc<GatewayState>,
}

impl FrameDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<GatewayState>) -> Self {
        Self { state }
    }

    /// Verarbeitet einen eingehenden Frame
    ///
    /// Fachliche Fehler fuehren nie zu `Trennen` – der Frame wird geloggt
    /// und verworfen. Nur eine fehlgeschlagene Mitarbeiter-Anmeldung
    /// beendet die Verbindung.
    pub fn dispatch(
        &self,
        frame: EingehendesFrame,
        ctx: &mut VerbindungsKontext,
    ) -> DispatchAusgang {
        match frame {
            // ---------------------------------------------------------------
            // Login (nur als erster Frame)
            // ---------------------------------------------------------------
            EingehendesFrame::LoginUser(anfrage) => {
                if ctx.identitaet.is_some() {
                    tracing::warn!(peer = %ctx.peer_addr, "Doppelte Anmeldung – Frame verworfen");
                    return DispatchAusgang::Weiter;
                }

                let benutzer = self.state.dienst.benutzer_verbinden(
                    anfrage.user_id,
                    anfrage.name,
                    Arc::clone(&ctx.senke),
                );
                tracing::debug!(peer = %ctx.peer_addr, benutzer = %benutzer.id, "Verbindung angemeldet");
                ctx.identitaet = Some(Identitaet::Benutzer(benutzer.id));
                DispatchAusgang::Weiter
            }

            EingehendesFrame::LoginStaff(anfrage) => {
                if ctx.identitaet.is_some() {
                    tracing::warn!(peer = %ctx.peer_addr, "Doppelte Anmeldung – Frame verworfen");
                    return DispatchAusgang::Weiter;
                }

                match self.state.dienst.mitarbeiter_verbinden(
                    anfrage.staff_id,
                    anfrage.name,
                    anfrage.group_id,
                    Arc::clone(&ctx.senke),
                ) {
                    Ok(mitarbeiter) => {
                        tracing::debug!(
                            peer = %ctx.peer_addr,
                            mitarbeiter = %mitarbeiter.id,
                            "Verbindung angemeldet"
                        );
                        ctx.identitaet = Some(Identitaet::Mitarbeiter(mitarbeiter.id));
                        DispatchAusgang::Weiter
                    }
                    Err(fehler) => {
                        tracing::warn!(
                            peer = %ctx.peer_addr,
                            fehler = %fehler,
                            "Mitarbeiter-Anmeldung fehlgeschlagen – Verbindung wird beendet"
                        );
                        DispatchAusgang::Trennen
                    }
                }
            }

            // ---------------------------------------------------------------
            // Keepalive
            // ---------------------------------------------------------------
            EingehendesFrame::Pong(_) => {
                // Der Empfang selbst zaehlt bereits als Lebenszeichen
                tracing::trace!(peer = %ctx.peer_addr, "Pong empfangen");
                DispatchAusgang::Weiter
            }

            // ---------------------------------------------------------------
            // Fachliche Frames – erfordern eine Identitaet
            // ---------------------------------------------------------------
            frame => {
                match &ctx.identitaet {
                    None => {
                        tracing::warn!(peer = %ctx.peer_addr, "Frame vor Anmeldung verworfen");
                    }
                    Some(Identitaet::Benutzer(benutzer_id)) => match frame {
                        EingehendesFrame::Message(anfrage) => {
                            benutzer_handler::handle_nachricht(anfrage, benutzer_id, &self.state);
                        }
                        _ => {
                            tracing::warn!(
                                peer = %ctx.peer_addr,
                                benutzer = %benutzer_id,
                                "Frame nur fuer Mitarbeiter erlaubt – verworfen"
                            );
                        }
                    },
                    Some(Identitaet::Mitarbeiter(mitarbeiter_id)) => match frame {
                        EingehendesFrame::ConnectUser(anfrage) => {
                            mitarbeiter_handler::handle_connect_user(
                                anfrage,
                                mitarbeiter_id,
                                &self.state,
                            );
                        }
                        EingehendesFrame::TransferSession(anfrage) => {
                            mitarbeiter_handler::handle_transfer_session(
                                anfrage,
                                mitarbeiter_id,
                                &self.state,
                            );
                        }
                        EingehendesFrame::Message(anfrage) => {
                            mitarbeiter_handler::handle_nachricht(
                                anfrage,
                                mitarbeiter_id,
                                &self.state,
                            );
                        }
                        _ => {
                            tracing::warn!(
                                peer = %ctx.peer_addr,
                                mitarbeiter = %mitarbeiter_id,
                                "Unerwarteter Frame – verworfen"
                            );
                        }
                    },
                }
                DispatchAusgang::Weiter
            }
        }
    }

    /// Bereinigt die Verbindung beim Ende ihres Tasks
    ///
    /// Zieht genau einmal das Trennen in der Registry nach – egal warum
    /// die Lese-Schleife endete. `take` stellt die Einmaligkeit sicher.
    pub fn verbindung_bereinigen(&self, ctx: &mut VerbindungsKontext) {
        match ctx.identitaet.take() {
            Some(Identitaet::Benutzer(benutzer_id)) => {
                self.state.dienst.benutzer_trennen(&benutzer_id);
                tracing::debug!(peer = %ctx.peer_addr, benutzer = %benutzer_id, "Verbindung bereinigt");
            }
            Some(Identitaet::Mitarbeiter(mitarbeiter_id)) => {
                self.state.dienst.mitarbeiter_trennen(&mitarbeiter_id);
                tracing::debug!(peer = %ctx.peer_addr, mitarbeiter = %mitarbeiter_id, "Verbindung bereinigt");
            }
            None => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
