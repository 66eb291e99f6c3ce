//! Authenticated transport: the seam between the node and the network.
//!
//! The node never talks HTTP itself. It hands every [`RequestDescriptor`] to an
//! [`AuthenticatedTransport`], which resolves the OAuth2 access token for the
//! named credential and performs the call. Tests substitute an in-memory fake.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NodeError;
use crate::node::RequestDescriptor;

mod http;

pub use http::{OAuth2HttpTransport, StaticToken, TokenSource};

/// Sends a request with valid OAuth2 credentials attached.
#[async_trait]
pub trait AuthenticatedTransport: Send + Sync {
    /// Performs the request described by `request` using the credential
    /// registered under `credential`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` - Parsed JSON response
    /// * `Ok(None)` - Successful response without a body
    /// * `Err(NodeError::Transport)` - Network, token, or HTTP status failure
    async fn authenticated_request(
        &self,
        credential: &str,
        request: &RequestDescriptor,
    ) -> Result<Option<Value>, NodeError>;
}
