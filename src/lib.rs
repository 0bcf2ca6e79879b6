//! Library crate for gacha-codes-back, exposing modules for binaries and integration tests.

pub mod clock;
pub mod config;
/// Durable storage: cache rows, redeemed codes and preferences.
pub mod dao;
mod dto;
mod error;
pub mod remote;
/// HTTP surface.
pub mod routes;
/// Operations composed over the shared state.
pub mod services;
/// In-memory state shared across requests and background tasks.
pub mod state;

#[cfg(test)]
mod test_support;
