//! Bling ERP connector for workflow-automation hosts.
//!
//! Maps a (resource, operation) selection plus per-item parameters onto calls
//! to the Bling API v3 (contacts, products, payable accounts), authenticated
//! with an OAuth2 authorization-code credential.
//!
//! # Core Types
//!
//! - [`BlingNode`] - Executes a batch of items, one request per item
//! - [`AuthenticatedTransport`] - Injected capability performing the HTTP call
//! - [`BlingOAuth2Api`] - OAuth2 credential descriptor
//! - [`BatchPolicy`] - Continue-on-fail behaviour for a batch

// Host configuration
pub mod config;

// OAuth2 credential descriptor and token storage
pub mod credentials;

// Dispatcher error types
pub mod error;

// Node description, request building and batch execution
pub mod node;

// Authorization-code exchange
pub mod oauth;

// Authenticated HTTP transport
pub mod transport;

pub use credentials::{BlingOAuth2Api, CredentialStore, Credentials};
pub use error::{BatchError, NodeError};
pub use node::{BatchPolicy, BlingNode, Invocation, Operation, OutputRecord, Resource};
pub use transport::{AuthenticatedTransport, OAuth2HttpTransport};
