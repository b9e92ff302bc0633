//! Control-plane transport: signed RPC client and wire types.

pub mod client;
pub mod types;

pub use client::ApiClient;
