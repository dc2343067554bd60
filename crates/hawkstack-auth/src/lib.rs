//! Hawk HTTP request authentication for HawkStack.
//!
//! This crate implements version 1 of the Hawk scheme on both sides of the
//! wire: clients sign requests with a shared key, servers verify them and
//! sign their responses, and either side can issue or check single-URL
//! bewit tokens.
//!
//! # Overview
//!
//! Hawk never sends the key. Instead each request carries a timestamp, a
//! nonce and an HMAC over a normalized string built from the method, path,
//! host, port, optional payload hash and optional extension data. The server
//! rebuilds that string from the request it received, verifies the MAC in
//! constant time, and rejects timestamps outside its skew window as well as
//! nonces it has already seen within it.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hawkstack_auth::client::Client;
//! use hawkstack_auth::credentials::{Credentials, StaticCredentialProvider};
//! use hawkstack_auth::request::RequestAttributes;
//! use hawkstack_auth::server::Server;
//! use hawkstack_core::{Algorithm, HawkConfig};
//!
//! let credentials = Credentials::new("dh37fgj492je", vec![7u8; 32], Algorithm::Sha256);
//! let client = Client::new(credentials.clone());
//! let server = Server::from_config(
//!     Arc::new(StaticCredentialProvider::new(vec![credentials])),
//!     &HawkConfig::default(),
//! );
//!
//! let request = RequestAttributes::new("GET", "example.com", 443, "/resource");
//! let signed = client.header(&request).unwrap();
//! let authenticated = server.authenticate(&request, &signed.authorization(), None).unwrap();
//! assert_eq!(authenticated.credentials.id, "dh37fgj492je");
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Normalized string construction and MAC calculation
//! - [`mac`] - HMAC signing and constant-time verification
//! - [`payload`] - Payload hashing
//! - [`header`] - `Authorization`, `Server-Authorization` and `WWW-Authenticate` codec
//! - [`bewit`] - Bewit token codec and query handling
//! - [`replay`] - Timestamp window, nonce replay guard and background sweeper
//! - [`client`] - Request signing, response authentication, bewit issuing, clock resync
//! - [`server`] - Request and bewit authentication, response signing, challenges
//! - [`transport`] - Adapter over `http` request and response types
//! - [`credentials`] - Credentials and the credential provider trait
//! - [`error`] - Authentication error types

pub mod bewit;
pub mod canonical;
pub mod client;
pub mod credentials;
pub mod error;
pub mod header;
pub mod mac;
pub mod nonce;
pub mod payload;
pub mod replay;
pub mod request;
pub mod server;
pub mod transport;

pub use client::{Client, SignedRequest};
pub use credentials::{CredentialProvider, Credentials, Key, StaticCredentialProvider};
pub use error::{AuthError, AuthResult};
pub use header::Header;
pub use payload::PayloadHasher;
pub use replay::{FreshnessGuard, NonceSweeper};
pub use request::{RequestArtifacts, RequestAttributes};
pub use server::{Authenticated, AuthenticatedBewit, ResponseOptions, Server};
