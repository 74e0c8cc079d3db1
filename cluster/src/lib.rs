//! Cluster membership helpers.
//!
//! Only server allocation lives here for now: picking a set of healthy
//! servers from the configuration directory to host new partitions.

pub mod server_allocator;

pub use server_allocator::{
    AllocationError, ConfigDirectory, ServerAllocator, ServerConfig, ServerStatus,
};
