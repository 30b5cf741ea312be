//! Client-Verbindung – verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientVerbindung` in einem eigenen
//! tokio-Task. Dieser Task ist der EINZIGE Schreiber auf dem Socket: er
//! leert die Send-Queue der eigenen `VerbindungsSenke` und schreibt die
//! Keepalive-Pings.
//!
//! ## Ablauf
//! ```text
//! Verbunden -> login_user/login_staff -> Angemeldet -> ... -> Getrennt
//! ```
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Bleibt die Verbindung `verbindungs_timeout_sek` ohne eingehenden
//!   Frame, wird sie getrennt
//!
//! ## Fehler-Politik
//! Nicht parsebare Frames werden geloggt und verworfen; nur Lese-/
//! Schreibfehler, Timeout oder Shutdown beenden die Schleife. Danach wird
//! genau einmal das Trennen in der Registry nachgezogen.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use sprechstunde_protocol::frames::{AusgehendesFrame, EingehendesFrame};
use sprechstunde_protocol::wire::FrameCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::dispatcher::{DispatchAusgang, FrameDispatcher, VerbindungsKontext};
use crate::server_state::GatewayState;
use crate::versand::{VerbindungsSenke, VersandAuftrag};

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, dispatcht an den `FrameDispatcher` und
/// liefert ausgehende Frames aus der eigenen Send-Queue aus. Laeuft in
/// einem eigenen tokio-Task.
pub struct ClientVerbindung {
    state: Arc<GatewayState>,
    peer_addr: SocketAddr,
}

impl ClientVerbindung {
    /// Erstellt eine neue ClientVerbindung
    pub fn neu(state: Arc<GatewayState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Diese Methode laeuft bis die Verbindung getrennt wird oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        // Framed-Stream: der Codec rahmt nur, JSON wird hier geparst
        let mut framed = Framed::new(
            stream,
            FrameCodec::with_max_size(self.state.config.max_frame_groesse),
        );

        // Send-Queue dieser Verbindung; der Handle wandert beim Login in
        // die Registry, die Queue wird nur von dieser Schleife geleert
        let (senke, mut sende_rx) = VerbindungsSenke::neu(peer_addr.to_string());

        let dispatcher = FrameDispatcher::neu(Arc::clone(&self.state));
        let mut ctx = VerbindungsKontext {
            peer_addr,
            senke,
            identitaet: None,
        };

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();
        // Zeitpunkt des naechsten Ping
        let mut naechster_ping = Instant::now() + keepalive_intervall;

        loop {
            let jetzt = Instant::now();

            // Timeout-Pruefung
            if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                tracing::warn!(peer = %peer_addr, "Verbindungs-Timeout");
                break;
            }

            // Naechsten Ping-Zeitpunkt berechnen
            let ping_verzoegerung = if jetzt < naechster_ping {
                naechster_ping.duration_since(jetzt)
            } else {
                Duration::from_millis(1)
            };

            tokio::select! {
                // Eingehender Frame vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(daten)) => {
                            letzter_empfang = Instant::now();

                            let text = match std::str::from_utf8(&daten) {
                                Ok(text) => text,
                                Err(fehler) => {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %fehler,
                                        "Frame ist kein gueltiges UTF-8 – verworfen"
                                    );
                                    continue;
                                }
                            };

                            match EingehendesFrame::from_json(text) {
                                Ok(eingehend) => {
                                    tracing::trace!(peer = %peer_addr, "Frame empfangen");
                                    if dispatcher.dispatch(eingehend, &mut ctx)
                                        == DispatchAusgang::Trennen
                                    {
                                        break;
                                    }
                                }
                                Err(fehler) => {
                                    // Ein einzelner ungueltiger Frame beendet
                                    // die Verbindung nicht
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %fehler,
                                        "Ungueltiger Frame – verworfen"
                                    );
                                }
                            }
                        }
                        Some(Err(fehler)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %fehler,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            // Verbindung geschlossen
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehender Auftrag aus der eigenen Send-Queue
                Some(auftrag) = sende_rx.recv() => {
                    match auftrag {
                        VersandAuftrag::Frame(daten) => {
                            if let Err(fehler) = framed.send(Bytes::from(daten)).await {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    fehler = %fehler,
                                    "Senden fehlgeschlagen"
                                );
                                break;
                            }
                        }
                        VersandAuftrag::Schliessen => {
                            tracing::info!(peer = %peer_addr, "Verbindung auf Anforderung geschlossen");
                            break;
                        }
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if jetzt >= naechster_ping {
                        let ts = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;

                        match AusgehendesFrame::ping(ts).to_json() {
                            Ok(json) => {
                                if let Err(fehler) = framed.send(Bytes::from(json.into_bytes())).await {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %fehler,
                                        "Ping-Senden fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                            Err(fehler) => {
                                tracing::error!(fehler = %fehler, "Ping-Serialisierung fehlgeschlagen");
                            }
                        }
                        naechster_ping = Instant::now() + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende – laeuft genau einmal, egal warum
        // die Schleife endete
        dispatcher.verbindung_bereinigen(&mut ctx);

        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }
}
