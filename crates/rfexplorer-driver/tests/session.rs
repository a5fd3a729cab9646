//! Session tests over an in-memory duplex transport, with the test body
//! playing the instrument side of the link.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use rfexplorer_driver::{DriverError, RfExplorer};
use rfexplorer_protocol::{CalculatorMode, MarkerMode, Packet, Preset};

const CONFIG_LINE: &[u8] =
    b"#C2-F:0000463,0000464,0000,-120,0112,0,0,0000463,0000464,0001,00300,0,2\r\n";
const RETUNED_LINE: &[u8] =
    b"#C2-F:0433050,0434790,0000,-120,0112,0,0,0000050,0960000,0959950,00015,0,0\r\n";

/// Open a session against a scripted instrument: answer the handshake's
/// configuration request and hand back both ends.
async fn open_session() -> (RfExplorer<DuplexStream>, DuplexStream) {
    let (host, mut device) = tokio::io::duplex(4096);
    let opening = tokio::spawn(RfExplorer::open(host));
    let mut cmd = [0u8; 4];
    device.read_exact(&mut cmd).await.unwrap();
    assert_eq!(&cmd, b"#\x04C0");
    device.write_all(CONFIG_LINE).await.unwrap();
    let session = opening.await.unwrap().unwrap();
    (session, device)
}

fn sample_preset() -> Preset {
    Preset {
        index: 3,
        name: "ISM 433".to_string(),
        min_freq_khz: 433_050,
        max_freq_khz: 434_790,
        calc_mode: CalculatorMode::Max,
        amp_top_dbm: -30,
        amp_bottom_dbm: -110,
        calc_iterations: 4,
        mainboard: true,
        marker_mode: MarkerMode::Peak,
    }
}

#[tokio::test]
async fn open_handshake_caches_config() {
    let (session, _device) = open_session().await;
    let config = session.config();
    assert_eq!(config.start_freq_khz, 463);
    assert_eq!(config.sweep_steps, 112);
    session.close().await.unwrap();
}

#[tokio::test]
async fn open_fails_when_link_closes_without_config() {
    let (host, mut device) = tokio::io::duplex(4096);
    let opening = tokio::spawn(RfExplorer::open(host));
    let mut cmd = [0u8; 4];
    device.read_exact(&mut cmd).await.unwrap();
    drop(device);
    let err = opening.await.unwrap().unwrap_err();
    assert!(matches!(err, DriverError::SetupFailed));
}

#[tokio::test]
async fn open_discards_pre_config_traffic() {
    let (host, mut device) = tokio::io::duplex(4096);
    let opening = tokio::spawn(RfExplorer::open(host));
    let mut cmd = [0u8; 4];
    device.read_exact(&mut cmd).await.unwrap();
    // an instrument already mid-stream floods the link with more traffic
    // than the dispatch channel holds before answering
    for _ in 0..32 {
        device.write_all(b"#QA:0\r\n").await.unwrap();
    }
    device.write_all(CONFIG_LINE).await.unwrap();
    let session = tokio::time::timeout(Duration::from_secs(2), opening)
        .await
        .expect("open must not stall on pre-config traffic")
        .unwrap()
        .unwrap();
    assert_eq!(session.config().start_freq_khz, 463);
}

#[tokio::test]
async fn packets_delivered_in_arrival_order() {
    let (mut session, mut device) = open_session().await;
    let mut stream = Vec::new();
    stream.extend_from_slice(&[b'$', b'S', 3, 0x10, 0x20, 0x30, 0x0D, 0x0A]);
    stream.extend_from_slice(b"#SnSN0001\r\n");
    device.write_all(&stream).await.unwrap();

    let Some(Packet::SweepData(sweep)) = session.recv().await else {
        panic!("expected SweepData first");
    };
    assert_eq!(sweep.samples, vec![-8.0, -16.0, -24.0]);
    assert_eq!(
        session.recv().await,
        Some(Packet::SerialNumber("SN0001".to_string()))
    );
}

#[tokio::test]
async fn config_cache_tracks_latest_report() {
    let (mut session, mut device) = open_session().await;
    assert_eq!(session.config().start_freq_khz, 463);

    device.write_all(RETUNED_LINE).await.unwrap();
    let Some(Packet::CurrentConfig(updated)) = session.recv().await else {
        panic!("expected the retuned CurrentConfig");
    };
    assert_eq!(updated.start_freq_khz, 433_050);
    // the cache was replaced before the packet was delivered
    assert_eq!(session.config(), updated);
}

#[tokio::test]
async fn preset_write_acknowledged() {
    let (mut session, mut device) = open_session().await;
    let device_task = tokio::spawn(async move {
        let mut frame = [0u8; 36];
        device.read_exact(&mut frame).await.unwrap();
        assert_eq!(frame[0], b'#');
        assert_eq!(frame[1], 36);
        assert_eq!(frame[5], 3);
        device.write_all(b"#PCK\r\n").await.unwrap();
        device
    });
    session
        .update_preset(&sample_preset(), Duration::from_secs(1))
        .await
        .unwrap();
    device_task.await.unwrap();
}

#[tokio::test]
async fn preset_write_times_out_without_ack() {
    let (mut session, _device) = open_session().await;
    let err = session
        .update_preset(&sample_preset(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::AckTimeout));
}

#[tokio::test]
async fn stale_ack_does_not_satisfy_a_later_write() {
    let (mut session, mut device) = open_session().await;
    // an unsolicited #PCK, e.g. the tail of an earlier preset listing
    device.write_all(b"#PCK\r\n").await.unwrap();
    assert_eq!(session.recv().await, Some(Packet::EndOfPresets));

    // device stays silent, so the write must time out rather than consume
    // the stale acknowledgment
    let err = session
        .update_preset(&sample_preset(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::AckTimeout));
}

#[tokio::test]
async fn close_shuts_down_the_link() {
    let (session, mut device) = open_session().await;
    session.close().await.unwrap();
    let mut buf = [0u8; 8];
    let n = device.read(&mut buf).await.unwrap();
    assert_eq!(n, 0);
}
