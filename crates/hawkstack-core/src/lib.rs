//! Core types, configuration, and state management for HawkStack.
//!
//! This crate provides the building blocks shared by the Hawk protocol
//! engine: the algorithm enum, environment-driven configuration, the clock
//! collaborator, and the concurrent nonce store backing replay protection.

mod clock;
mod config;
mod error;
mod state;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HawkConfig;
pub use error::{HawkStackError, HawkStackResult};
pub use state::{InMemoryNonceStore, NonceRecord, NonceStore, is_expired};
pub use types::{Algorithm, Timestamp};
