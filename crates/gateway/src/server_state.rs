//! Gemeinsamer Zustand des Gateways
//!
//! Haelt Konfiguration und Registry als Arc-Referenzen, die sicher
//! zwischen allen Verbindungs-Tasks geteilt werden.

use sprechstunde_kundendienst::KundendienstService;
use std::sync::Arc;
use std::time::Instant;

use sprechstunde_protocol::wire::DEFAULT_MAX_FRAME_SIZE;

/// Konfiguration des Gateways
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Keepalive-Intervall in Sekunden (Server sendet Ping)
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Maximale gleichzeitige Verbindungen (Benutzer + Mitarbeiter)
    pub max_clients: u32,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            max_clients: 512,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Gemeinsamer Gateway-Zustand (thread-safe, Arc-geteilt)
pub struct GatewayState {
    /// Gateway-Konfiguration
    pub config: Arc<GatewayConfig>,
    /// Die Verbindungs- und Sitzungs-Registry
    pub dienst: Arc<KundendienstService>,
    /// Startzeitpunkt (fuer Uptime-Berechnung)
    pub start_zeit: Instant,
}

impl GatewayState {
    /// Erstellt einen neuen GatewayState
    pub fn neu(config: GatewayConfig, dienst: Arc<KundendienstService>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            dienst,
            start_zeit: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_zeit.elapsed().as_secs()
    }

    /// Anzahl aller verbundenen Clients (Benutzer + Mitarbeiter)
    pub fn verbundene_clients(&self) -> usize {
        self.dienst.benutzer_anzahl() + self.dienst.mitarbeiter_anzahl()
    }
}
