//! sprechstunde-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und verdrahtet Registry, Gateway-Zustand
//! und TCP-Listener zu einem lauffaehigen Prozess.

pub mod config;

use anyhow::{Context, Result};
use sprechstunde_core::types::GruppenId;
use sprechstunde_gateway::{GatewayConfig, GatewayServer, GatewayState};
use sprechstunde_kundendienst::KundendienstService;
use std::net::SocketAddr;

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Registry anlegen und konfigurierte Gruppen registrieren
    /// 2. TCP-Listener starten (Gateway)
    /// 3. Auf Ctrl-C warten, dann Shutdown durchreichen
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            "Server startet"
        );

        let dienst = KundendienstService::neu();
        for eintrag in &self.config.gruppen {
            dienst.gruppe_erstellen(GruppenId::neu(&eintrag.id), &eintrag.name);
        }
        if self.config.gruppen.is_empty() {
            tracing::warn!("Keine Gruppen konfiguriert – Mitarbeiter koennen sich nicht anmelden");
        }

        let state = GatewayState::neu(
            GatewayConfig {
                keepalive_sek: self.config.gateway.keepalive_sek,
                verbindungs_timeout_sek: self.config.gateway.verbindungs_timeout_sek,
                max_clients: self.config.server.max_clients,
                max_frame_groesse: self.config.gateway.max_frame_groesse,
            },
            dienst,
        );

        let bind_addr: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse: {}", self.config.tcp_bind_adresse()))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let gateway = GatewayServer::neu(state, bind_addr);
        let gateway_task = tokio::spawn(gateway.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        gateway_task
            .await
            .context("Gateway-Task ist abgestuerzt")?
            .context("Gateway-Server beendete sich mit Fehler")?;

        Ok(())
    }
}
