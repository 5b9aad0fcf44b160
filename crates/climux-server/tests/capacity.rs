//! Connection cap, idle timeout, redirect transitions, and shutdown.

mod common;

use climux_core::{ClimuxError, ConnRegistry, RedirectState};
use climux_server::config::Config;
use climux_server::listener::CliServer;
use climux_server::state::ServerState;
use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[tokio::test]
async fn sixth_connection_is_refused() {
    let srv = start_server(TestServerOptions::default()).await;

    let mut clients = Vec::new();
    for _ in 0..5 {
        clients.push(srv.connect().await);
    }
    assert!(wait_for(|| srv.state.registry.count() == 5).await);

    let mut sixth = srv.connect().await;
    expect_eof(&mut sixth).await;
    assert_eq!(srv.state.registry.count(), 5);

    // The five established peers still work.
    clients[0].write_all(b"help\n").await.unwrap();
    assert!(wait_for(|| srv.log.lock().unwrap().len() == 1).await);
}

#[tokio::test]
async fn slot_reopens_after_disconnect() {
    let srv = start_server(TestServerOptions {
        max_connections: 2,
        ..Default::default()
    })
    .await;

    let first = srv.connect().await;
    let _second = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.count() == 2).await);

    drop(first);
    assert!(wait_for(|| srv.state.registry.count() == 1).await);

    let mut third = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.count() == 2).await);
    third.write_all(b"uptime\n").await.unwrap();
    assert!(wait_for(|| srv.log.lock().unwrap().len() == 1).await);
}

#[tokio::test]
async fn orderly_close_removes_exactly_one_peer() {
    let srv = start_server(TestServerOptions::default()).await;

    let first = srv.connect().await;
    let _second = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.count() == 2).await);

    drop(first);
    assert!(wait_for(|| srv.state.registry.count() == 1).await);

    // No further removals happen on their own.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(srv.state.registry.count(), 1);
}

#[tokio::test]
async fn idle_connection_is_closed() {
    let srv = start_server(TestServerOptions {
        idle_timeout_secs: 1,
        ..Default::default()
    })
    .await;

    let mut client = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.count() == 1).await);

    // Send nothing; the server must hang up on its own.
    expect_eof(&mut client).await;
    assert!(wait_for(|| srv.state.registry.count() == 0).await);
    assert!(srv.dispatches().is_empty());
}

#[tokio::test]
async fn activity_resets_the_idle_clock() {
    let srv = start_server(TestServerOptions {
        idle_timeout_secs: 1,
        ..Default::default()
    })
    .await;

    let mut client = srv.connect().await;
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        client.write_all(b"uptime\n").await.unwrap();
    }
    // Past the bound in wall time, but never idle for a full second.
    assert_eq!(srv.state.registry.count(), 1);
    assert!(wait_for(|| srv.log.lock().unwrap().len() == 3).await);
}

#[tokio::test]
async fn redirect_follows_peer_occupancy() {
    let srv = start_server(TestServerOptions::default()).await;
    assert_eq!(srv.state.registry.redirect_state(), RedirectState::SerialOnly);

    let first = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.redirect_state() == RedirectState::BroadcastToPeers).await);

    let second = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.count() == 2).await);
    assert_eq!(
        srv.state.registry.redirect_state(),
        RedirectState::BroadcastToPeers
    );

    drop(first);
    assert!(wait_for(|| srv.state.registry.count() == 1).await);
    assert_eq!(
        srv.state.registry.redirect_state(),
        RedirectState::BroadcastToPeers
    );

    drop(second);
    assert!(wait_for(|| srv.state.registry.redirect_state() == RedirectState::SerialOnly).await);
}

#[tokio::test]
async fn shutdown_tears_down_listener_and_peers() {
    let srv = start_server(TestServerOptions::default()).await;

    let mut client = srv.connect().await;
    assert!(wait_for(|| srv.state.registry.count() == 1).await);

    let addr = srv.handle.local_addr();
    srv.handle.shutdown().await;

    expect_eof(&mut client).await;
    assert!(wait_for(|| srv.state.registry.count() == 0).await);
    assert_eq!(
        srv.state.registry.redirect_state(),
        RedirectState::SerialOnly
    );
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn disabled_config_refuses_to_start() {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        enabled: false,
        ..Default::default()
    };
    let registry = Arc::new(ConnRegistry::new(config.max_connections));
    let interpreter = climux_server::shell::ShellInterpreter::new(registry.clone());
    let state = ServerState::new(
        config,
        registry,
        Box::new(interpreter),
        Arc::new(climux_server::serial::StdoutSerial),
    );

    match CliServer::start(state).await {
        Err(ClimuxError::Disabled) => {}
        other => panic!("expected Disabled error, got {:?}", other.map(|_| ())),
    }
}
