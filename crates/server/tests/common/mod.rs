// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for server integration tests

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use server::{Logger, Routes, Server, ServerConfig, ServerHandle, ShutdownConfig};
use tokio::task::JoinHandle;

/// A server started on an ephemeral port
pub struct RunningServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub task: JoinHandle<()>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Request shutdown and wait for `start` to return; yields the time it took
    pub async fn stop(self) -> Duration {
        let started = Instant::now();
        self.handle.shutdown();
        tokio::time::timeout(Duration::from_secs(15), self.task)
            .await
            .expect("server should stop in time")
            .expect("server task should not panic");
        started.elapsed()
    }
}

pub fn build_server(config: ServerConfig, routes: Routes, shutdown: ShutdownConfig) -> Server {
    Server::new(config, shutdown, routes, Logger::new("integration-tests"))
        .expect("Failed to create server")
}

pub async fn spawn_server(routes: Routes, shutdown: ShutdownConfig) -> RunningServer {
    let server = build_server(ServerConfig::for_testing(), routes, shutdown);
    let handle = server.handle();
    let task = tokio::spawn(server.start());
    let addr = handle
        .listening()
        .await
        .expect("Failed to start test server");

    RunningServer { addr, handle, task }
}

/// Client that does not keep idle connections around between requests
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .expect("Failed to build client")
}
