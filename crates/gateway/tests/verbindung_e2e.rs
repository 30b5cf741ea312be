//! Ende-zu-Ende-Tests ueber echte TCP-Verbindungen
//!
//! Faehrt den Gateway-Server auf einem Loopback-Port hoch und spielt den
//! kompletten Ablauf durch: Anmeldung beider Seiten, Sitzungs-Erstellung,
//! Nachrichtenaustausch in beide Richtungen, kaskadierendes Schliessen
//! beim Trennen des Mitarbeiters.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use sprechstunde_core::types::{BenutzerId, GruppenId, MitarbeiterId};
use sprechstunde_gateway::{GatewayConfig, GatewayServer, GatewayState};
use sprechstunde_kundendienst::{KundendienstService, SitzungsStatus};
use sprechstunde_protocol::frames::{
    AusgehendesFrame, ConnectUserAnfrage, EingehendesFrame, LoginStaffAnfrage, LoginUserAnfrage,
    NachrichtAnfrage,
};
use sprechstunde_protocol::wire::FrameCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::Framed;

/// Minimaler Test-Client mit demselben Wire-Format wie der Server
struct TestClient {
    framed: Framed<TcpStream, FrameCodec>,
}

impl TestClient {
    async fn verbinden(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Verbindung fehlgeschlagen");
        Self {
            framed: Framed::new(stream, FrameCodec::new()),
        }
    }

    async fn senden(&mut self, frame: &EingehendesFrame) {
        let json = frame.to_json().expect("Serialisierung fehlgeschlagen");
        self.framed
            .send(Bytes::from(json.into_bytes()))
            .await
            .expect("Senden fehlgeschlagen");
    }

    async fn roh_senden(&mut self, daten: &'static [u8]) {
        self.framed
            .send(Bytes::from_static(daten))
            .await
            .expect("Senden fehlgeschlagen");
    }

    /// Liest den naechsten fachlichen Frame; Keepalive-Pings werden
    /// uebersprungen
    async fn naechster_frame(&mut self) -> AusgehendesFrame {
        loop {
            let daten = tokio::time::timeout(Duration::from_secs(5), self.framed.next())
                .await
                .expect("Timeout beim Warten auf einen Frame")
                .expect("Verbindung unerwartet beendet")
                .expect("Lesefehler");
            let text = std::str::from_utf8(&daten).expect("Frame ist kein UTF-8");
            let frame = AusgehendesFrame::from_json(text).expect("Frame nicht dekodierbar");
            if !matches!(frame, AusgehendesFrame::Ping(_)) {
                return frame;
            }
        }
    }
}

/// Pollt bis die Bedingung wahr wird (der Server verarbeitet Frames asynchron)
async fn warte_bis(mut bedingung: impl FnMut() -> bool) {
    for _ in 0..500 {
        if bedingung() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Bedingung nicht innerhalb der Frist erfuellt");
}

/// Startet den Server auf einem freien Loopback-Port
async fn server_starten(
    config: GatewayConfig,
) -> (
    Arc<KundendienstService>,
    SocketAddr,
    watch::Sender<bool>,
    tokio::task::JoinHandle<std::io::Result<()>>,
) {
    let dienst = KundendienstService::neu();
    dienst.gruppe_erstellen(GruppenId::neu("g1"), "Support");
    let state = GatewayState::neu(config, Arc::clone(&dienst));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fehlgeschlagen");
    let addr = listener.local_addr().expect("local_addr fehlgeschlagen");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = GatewayServer::neu(state, addr);
    let task = tokio::spawn(server.starten_mit_listener(listener, shutdown_rx));

    (dienst, addr, shutdown_tx, task)
}

#[tokio::test]
async fn kompletter_ablauf_ueber_tcp() {
    let (dienst, addr, shutdown_tx, server_task) = server_starten(GatewayConfig::default()).await;

    // Benutzer meldet sich an
    let mut benutzer = TestClient::verbinden(addr).await;
    benutzer
        .senden(&EingehendesFrame::LoginUser(LoginUserAnfrage {
            user_id: BenutzerId::neu("u1"),
            name: "Erika".into(),
        }))
        .await;
    warte_bis(|| dienst.benutzer(&BenutzerId::neu("u1")).is_some()).await;

    // Mitarbeiter meldet sich an
    let mut mitarbeiter = TestClient::verbinden(addr).await;
    mitarbeiter
        .senden(&EingehendesFrame::LoginStaff(LoginStaffAnfrage {
            staff_id: MitarbeiterId::neu("s1"),
            name: "Anna".into(),
            group_id: GruppenId::neu("g1"),
        }))
        .await;
    warte_bis(|| dienst.mitarbeiter(&MitarbeiterId::neu("s1")).is_some()).await;

    // Ein kaputter Frame beendet die Verbindung nicht
    benutzer.roh_senden(b"das ist kein json").await;

    // Mitarbeiter zieht den Benutzer in eine Sitzung – beide Seiten
    // bekommen session_created
    mitarbeiter
        .senden(&EingehendesFrame::ConnectUser(ConnectUserAnfrage {
            user_id: BenutzerId::neu("u1"),
        }))
        .await;

    let session_id = match benutzer.naechster_frame().await {
        AusgehendesFrame::SessionCreated(info) => {
            assert_eq!(info.user_id.as_str(), "u1");
            assert_eq!(info.staff_id.as_str(), "s1");
            assert_eq!(info.status, "active");
            assert!(info.messages.is_empty());
            info.id
        }
        andere => panic!("Erwartet SessionCreated, erhalten: {:?}", andere),
    };
    match mitarbeiter.naechster_frame().await {
        AusgehendesFrame::SessionCreated(info) => assert_eq!(info.id, session_id),
        andere => panic!("Erwartet SessionCreated, erhalten: {:?}", andere),
    }

    // Benutzer -> Mitarbeiter (die Sitzung kommt aus dem Registry-Zustand)
    benutzer
        .senden(&EingehendesFrame::Message(NachrichtAnfrage {
            session_id: None,
            content: "hi".into(),
        }))
        .await;
    match mitarbeiter.naechster_frame().await {
        AusgehendesFrame::Message(info) => {
            assert_eq!(info.content, "hi");
            assert_eq!(info.from_id.as_str(), "u1");
            assert_eq!(info.to_id.as_str(), "s1");
        }
        andere => panic!("Erwartet Message, erhalten: {:?}", andere),
    }

    // Mitarbeiter -> Benutzer (mit benannter Sitzung)
    mitarbeiter
        .senden(&EingehendesFrame::Message(NachrichtAnfrage {
            session_id: Some(session_id.clone()),
            content: "hello".into(),
        }))
        .await;
    match benutzer.naechster_frame().await {
        AusgehendesFrame::Message(info) => {
            assert_eq!(info.content, "hello");
            assert_eq!(info.to_id.as_str(), "u1");
        }
        andere => panic!("Erwartet Message, erhalten: {:?}", andere),
    }

    // Der Verlauf traegt beide Nachrichten in Sende-Reihenfolge
    let sitzung = dienst.sitzung(&session_id).expect("Sitzung fehlt");
    assert_eq!(sitzung.messages.len(), 2);
    assert_eq!(sitzung.messages[0].content, "hi");
    assert_eq!(sitzung.messages[1].content, "hello");

    // Mitarbeiter trennt die Verbindung -> Kaskade schliesst seine Sitzung
    drop(mitarbeiter);
    warte_bis(|| dienst.mitarbeiter(&MitarbeiterId::neu("s1")).is_none()).await;
    assert_eq!(
        dienst.sitzung(&session_id).unwrap().status,
        SitzungsStatus::Geschlossen
    );

    // Die Benutzer-Seite bleibt unangetastet
    let benutzer_eintrag = dienst.benutzer(&BenutzerId::neu("u1")).unwrap();
    assert_eq!(benutzer_eintrag.session_id, Some(session_id));

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), server_task).await;
}

#[tokio::test]
async fn server_voll_lehnt_weitere_verbindungen_ab() {
    let config = GatewayConfig {
        max_clients: 1,
        ..GatewayConfig::default()
    };
    let (dienst, addr, shutdown_tx, server_task) = server_starten(config).await;

    let mut erster = TestClient::verbinden(addr).await;
    erster
        .senden(&EingehendesFrame::LoginUser(LoginUserAnfrage {
            user_id: BenutzerId::neu("u1"),
            name: "Erika".into(),
        }))
        .await;
    warte_bis(|| dienst.benutzer(&BenutzerId::neu("u1")).is_some()).await;

    // Die zweite Verbindung wird sofort verworfen
    let mut zweiter = TestClient::verbinden(addr).await;
    let ergebnis = tokio::time::timeout(Duration::from_secs(5), zweiter.framed.next()).await;
    match ergebnis {
        Ok(None) | Ok(Some(Err(_))) => {}
        andere => panic!("Erwartet geschlossene Verbindung, erhalten: {:?}", andere),
    }

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), server_task).await;
}

#[tokio::test]
async fn keepalive_ping_kommt_an() {
    let config = GatewayConfig {
        keepalive_sek: 1,
        ..GatewayConfig::default()
    };
    let (_dienst, addr, shutdown_tx, server_task) = server_starten(config).await;

    let mut client = TestClient::verbinden(addr).await;
    loop {
        let daten = tokio::time::timeout(Duration::from_secs(5), client.framed.next())
            .await
            .expect("Timeout beim Warten auf den Ping")
            .expect("Verbindung unerwartet beendet")
            .expect("Lesefehler");
        let text = std::str::from_utf8(&daten).expect("Frame ist kein UTF-8");
        if let AusgehendesFrame::Ping(_) = AusgehendesFrame::from_json(text).unwrap() {
            break;
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), server_task).await;
}

#[tokio::test]
async fn mitarbeiter_anmeldung_mit_unbekannter_gruppe_schliesst_die_verbindung() {
    let (dienst, addr, shutdown_tx, server_task) = server_starten(GatewayConfig::default()).await;

    let mut client = TestClient::verbinden(addr).await;
    client
        .senden(&EingehendesFrame::LoginStaff(LoginStaffAnfrage {
            staff_id: MitarbeiterId::neu("s1"),
            name: "Anna".into(),
            group_id: GruppenId::neu("gibt-es-nicht"),
        }))
        .await;

    let ergebnis = tokio::time::timeout(Duration::from_secs(5), client.framed.next()).await;
    match ergebnis {
        Ok(None) | Ok(Some(Err(_))) => {}
        andere => panic!("Erwartet geschlossene Verbindung, erhalten: {:?}", andere),
    }
    assert!(dienst.mitarbeiter(&MitarbeiterId::neu("s1")).is_none());

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), server_task).await;
}
