//! fabriclink - bootstrap client for a permissioned ledger network
//!
//! # Architecture
//!
//! The crate configures and boots a client session against a permissioned
//! ledger: it resolves an administrative identity, assembles a channel from
//! the network profile, drives the channel through its join lifecycle and
//! wires up an event subscription. Consensus, endorsement and storage live
//! on the other side of the [`network::LedgerNetwork`] seam.
//!
//! ## Bootstrap
//! - [`client`] - Settings and the initialize sequence
//! - [`sdk`] - SDK factory and system client
//! - [`identity`] - Admin identities and sessions
//!
//! ## Channel & Events
//! - [`channel`] - Channel handles, assembly and join lifecycle
//! - [`events`] - Event-hub wiring
//!
//! ## Network Seam
//! - [`network`] - `LedgerNetwork` trait and the in-memory simulation
//!
//! ## Configuration & Utilities
//! - [`profile`] - Typed network-profile configuration
//! - [`logging`] - Logging setup
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Bootstrap
// ============================================================================
pub mod client;
pub mod identity;
pub mod sdk;

// ============================================================================
// Channel & Events
// ============================================================================
pub mod channel;
pub mod events;

// ============================================================================
// Network Seam
// ============================================================================
pub mod network;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod error;
pub mod logging;
pub mod profile;

pub use client::{ClientSettings, LedgerClient};
pub use error::{ClientError, Result};
