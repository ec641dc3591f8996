use std::time::Duration;

use futures::{SinkExt, StreamExt};
use securelock_network::{
    RemoteCommand, TcpTelemetry, TcpTelemetryConfig, TelemetryError, TelemetrySink,
};
use tokio::net::TcpListener;
use tokio_util::codec::{Framed, LinesCodec};

async fn listener() -> (TcpListener, TcpTelemetryConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = TcpTelemetryConfig {
        address: listener.local_addr().unwrap(),
        timeout_ms: 1000,
    };
    (listener, config)
}

async fn wait_for_command(client: &mut TcpTelemetry) -> Option<String> {
    for _ in 0..100 {
        if let Some(command) = client.get_command() {
            return Some(command);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn test_lines_reach_server() {
    let (listener, config) = listener().await;
    let mut client = TcpTelemetry::new(config);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, LinesCodec::new());
        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();
        (first, second)
    });

    client.send_log("System: System initialized").await.unwrap();
    client.send_log("User1: GRANTED - Access granted").await.unwrap();
    assert!(client.is_connected());

    let (first, second) = server.await.unwrap();
    assert_eq!(first, "System: System initialized");
    assert_eq!(second, "User1: GRANTED - Access granted");
}

#[tokio::test]
async fn test_server_commands_queued() {
    let (listener, config) = listener().await;
    let mut client = TcpTelemetry::new(config);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, LinesCodec::new());
        framed.next().await.unwrap().unwrap();
        framed.send("UNLOCK").await.unwrap();
        framed.send("").await.unwrap();
        framed.send("STATUS").await.unwrap();
        framed
    });

    client.send_log("System: System initialized").await.unwrap();
    let _framed = server.await.unwrap();

    let first = wait_for_command(&mut client).await.unwrap();
    assert_eq!(RemoteCommand::parse(&first), RemoteCommand::Unlock);
    let second = wait_for_command(&mut client).await.unwrap();
    assert_eq!(RemoteCommand::parse(&second), RemoteCommand::Status);
}

#[tokio::test]
async fn test_overlong_command_discarded() {
    let (listener, config) = listener().await;
    let mut client = TcpTelemetry::new(config);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, LinesCodec::new());
        framed.next().await.unwrap().unwrap();
        framed.send("X".repeat(300)).await.unwrap();
        framed.send("UNLOCK").await.unwrap();
        framed
    });

    client.send_log("System: System initialized").await.unwrap();
    let _framed = server.await.unwrap();

    assert_eq!(wait_for_command(&mut client).await.as_deref(), Some("UNLOCK"));
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_reconnects_after_server_closes() {
    let (listener, config) = listener().await;
    let mut client = TcpTelemetry::new(config);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, LinesCodec::new());
        let first = framed.next().await.unwrap().unwrap();
        drop(framed);

        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, LinesCodec::new());
        let second = framed.next().await.unwrap().unwrap();
        framed.send("STATUS").await.unwrap();
        (first, second, framed)
    });

    client.send_log("System: System initialized").await.unwrap();
    for _ in 0..100 {
        if !client.is_connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!client.is_connected());

    client.send_log("System: System heartbeat OK").await.unwrap();
    let (first, second, _framed) = server.await.unwrap();
    assert_eq!(first, "System: System initialized");
    assert_eq!(second, "System: System heartbeat OK");
    assert_eq!(wait_for_command(&mut client).await.as_deref(), Some("STATUS"));
}

#[tokio::test]
async fn test_refused_connection_reported() {
    let (listener, config) = listener().await;
    drop(listener);

    let mut client = TcpTelemetry::new(config);
    let result = client.send_log("System: System initialized").await;
    assert!(matches!(result, Err(TelemetryError::Io(_))));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_local_command_injection() {
    let mut client = TcpTelemetry::new(TcpTelemetryConfig::default());
    assert!(client.command_sender().push("REBOOT"));
    assert!(client.has_command());
    assert_eq!(client.get_command().as_deref(), Some("REBOOT"));
}
