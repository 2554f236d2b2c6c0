// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! SIGTERM handling, in its own test binary because the signal goes to this process

#![cfg(unix)]

mod common;

use std::{net::TcpStream, process::Command, time::Duration};

use common::build_server;
use server::{LifecycleState, ServerConfig, ShutdownConfig};

#[tokio::test]
async fn sigterm_stops_the_server() {
    let server = build_server(
        ServerConfig::for_testing(),
        Vec::new(),
        ShutdownConfig::default(),
    );
    let handle = server.handle();
    let task = tokio::spawn(server.start());

    let addr = handle
        .listening()
        .await
        .expect("Failed to start test server");
    assert_eq!(handle.state(), LifecycleState::Running);
    // let wait_shutdown install its handlers before the signal is sent
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(status.success());

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server should stop after SIGTERM")
        .expect("server task should not panic");

    assert_eq!(handle.state(), LifecycleState::Stopped);
    assert!(handle.cancellation_token().is_cancelled());
    assert!(TcpStream::connect(addr).is_err());
}
