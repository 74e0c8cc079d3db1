use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Up,
    Down,
    Loading,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            ServerStatus::Up => "SERVER_UP",
            ServerStatus::Down => "SERVER_DOWN",
            ServerStatus::Loading => "SERVER_LOADING",
        };
        write!(f, "{}", status)
    }
}

/// One entry of the cluster configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_id: String,
    pub status: ServerStatus,
    pub is_dead: bool,
    pub is_leaving: bool,
}

impl ServerConfig {
    /// A live server that accepts new work.
    pub fn up(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            status: ServerStatus::Up,
            is_dead: false,
            is_leaving: false,
        }
    }

    pub fn with_status(mut self, status: ServerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn dead(mut self) -> Self {
        self.is_dead = true;
        self
    }

    pub fn leaving(mut self) -> Self {
        self.is_leaving = true;
        self
    }

    /// Whether new partitions may be placed on this server.
    pub fn is_allocatable(&self) -> bool {
        !self.is_dead && !self.is_leaving && self.status == ServerStatus::Up
    }
}

/// Read access to the cluster's server list.
pub trait ConfigDirectory: Send + Sync {
    fn list_servers(&self) -> Vec<ServerConfig>;
}

impl ConfigDirectory for Vec<ServerConfig> {
    fn list_servers(&self) -> Vec<ServerConfig> {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("not enough live servers: requested {requested}, found {found}")]
    NotEnoughLiveServers { requested: usize, found: usize },
}

/// Spreads new allocations across the cluster by probing the directory from a
/// random offset.
pub struct ServerAllocator {
    directory: Arc<dyn ConfigDirectory>,
}

impl ServerAllocator {
    pub fn new(directory: Arc<dyn ConfigDirectory>) -> Self {
        Self { directory }
    }

    /// Adds `num_servers` allocatable servers to `servers`, skipping ids the
    /// set already holds.
    ///
    /// On failure the servers found so far stay in the set.
    pub fn allocate_servers(
        &self,
        num_servers: usize,
        servers: &mut BTreeSet<String>,
    ) -> Result<(), AllocationError> {
        self.allocate_servers_with_rng(num_servers, servers, &mut rand::thread_rng())
    }

    /// Like [`allocate_servers`](Self::allocate_servers) with an explicit
    /// source for the start offset.
    pub fn allocate_servers_with_rng<R: RngCore + ?Sized>(
        &self,
        num_servers: usize,
        servers: &mut BTreeSet<String>,
        rng: &mut R,
    ) -> Result<(), AllocationError> {
        if num_servers == 0 {
            return Ok(());
        }

        let all_servers = self.directory.list_servers();
        let len = all_servers.len() as u64;
        let mut idx: u64 = rng.gen();
        let mut allocated = 0;

        for _ in 0..all_servers.len() {
            idx = idx.wrapping_add(1);
            let server = &all_servers[(idx % len) as usize];

            if !server.is_allocatable() || servers.contains(&server.server_id) {
                continue;
            }

            servers.insert(server.server_id.clone());
            allocated += 1;
            if allocated == num_servers {
                break;
            }
        }

        if allocated < num_servers {
            warn!(
                requested = num_servers,
                found = allocated,
                directory_size = all_servers.len(),
                "server allocation failed"
            );
            return Err(AllocationError::NotEnoughLiveServers {
                requested: num_servers,
                found: allocated,
            });
        }

        debug!(count = allocated, "allocated servers");
        Ok(())
    }
}
