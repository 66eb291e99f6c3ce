//! Bling OAuth2 credential: descriptor, tokens and local token storage.
//!
//! The descriptor declares the authorization-code flow the Bling API expects.
//! Tokens obtained from that flow are kept in a [`CredentialStore`] so the
//! HTTP transport can attach them to API calls.
//!
//! # Usage
//!
//! ```no_run
//! use bling_connector::credentials::{BlingOAuth2Api, CredentialStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let credential = BlingOAuth2Api::new("client-id", "client-secret");
//! let (url, _state) = credential.authorization_url("http://localhost:5678/callback");
//! println!("Open {}", url);
//!
//! let key = std::env::var("BLING_ENCRYPTION_KEY")?;
//! let store = CredentialStore::new("bling_credentials.db", &key)?;
//! if let Some(tokens) = store.get(credential.name())? {
//!     println!("Token expires at {:?}", tokens.expires_at);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

mod encryption;
mod storage;

pub use storage::CredentialStore;

/// Credential type name the node requires.
pub const CREDENTIAL_NAME: &str = "blingOAuth2Api";
pub const DISPLAY_NAME: &str = "Bling OAuth2 API";
pub const DOCUMENTATION_URL: &str = "https://developer.bling.com.br/aplicativos";
pub const AUTH_URL: &str = "https://www.bling.com.br/Api/v3/oauth/authorize";
pub const TOKEN_URL: &str = "https://api.bling.com.br/Api/v3/oauth/token";
pub const AUTH_QUERY_PARAMETERS: &str = "response_type=code";
pub const SCOPE: &str = "";

/// OAuth2 grant used by Bling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrantType {
    AuthorizationCode,
}

/// Where client credentials travel on token requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenAuthentication {
    /// HTTP Basic `Authorization` header.
    Header,
    /// `client_id` / `client_secret` form fields.
    Body,
}

/// Bling OAuth2 credential configuration.
///
/// Everything except the client id/secret pair is fixed by Bling.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlingOAuth2Api {
    pub grant_type: GrantType,
    pub auth_url: String,
    pub access_token_url: String,
    pub scope: String,
    pub auth_query_parameters: String,
    pub authentication: TokenAuthentication,
    pub client_id: String,
    /// Read from host input, never written out.
    #[serde(skip_serializing)]
    pub client_secret: String,
}

impl BlingOAuth2Api {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            grant_type: GrantType::AuthorizationCode,
            auth_url: AUTH_URL.to_string(),
            access_token_url: TOKEN_URL.to_string(),
            scope: SCOPE.to_string(),
            auth_query_parameters: AUTH_QUERY_PARAMETERS.to_string(),
            authentication: TokenAuthentication::Header,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        CREDENTIAL_NAME
    }

    /// Builds the authorize URL with a fresh CSRF `state`.
    ///
    /// Returns `(url, state)`; the caller must check `state` on callback.
    pub fn authorization_url(&self, redirect_uri: &str) -> (String, String) {
        let state = Uuid::new_v4().to_string();
        (self.authorization_url_with_state(&state, redirect_uri), state)
    }

    pub fn authorization_url_with_state(&self, state: &str, redirect_uri: &str) -> String {
        let mut url = format!(
            "{}?{}&client_id={}&redirect_uri={}&state={}",
            self.auth_url,
            self.auth_query_parameters,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        );
        if !self.scope.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(&self.scope));
        }
        url
    }

    /// Declarative field list for the host's credential form.
    ///
    /// Fixed values are `hidden`; the client pair is required input and the
    /// secret is rendered as a password field.
    pub fn properties() -> Value {
        json!([
            { "displayName": "Grant Type", "name": "grantType", "type": "hidden", "default": "authorizationCode" },
            { "displayName": "Authorization URL", "name": "authUrl", "type": "hidden", "default": AUTH_URL },
            { "displayName": "Access Token URL", "name": "accessTokenUrl", "type": "hidden", "default": TOKEN_URL },
            { "displayName": "Scope", "name": "scope", "type": "hidden", "default": SCOPE },
            { "displayName": "Auth URI Query Parameters", "name": "authQueryParameters", "type": "hidden", "default": AUTH_QUERY_PARAMETERS },
            { "displayName": "Authentication", "name": "authentication", "type": "hidden", "default": "header" },
            {
                "displayName": "Client ID",
                "name": "clientId",
                "type": "string",
                "default": "",
                "required": true,
                "description": "Client ID obtido ao criar o aplicativo no Bling"
            },
            {
                "displayName": "Client Secret",
                "name": "clientSecret",
                "type": "string",
                "typeOptions": { "password": true },
                "default": "",
                "required": true,
                "description": "Client Secret obtido ao criar o aplicativo no Bling"
            }
        ])
    }

    /// Full credential type description (name, extends, properties).
    pub fn describe() -> Value {
        json!({
            "name": CREDENTIAL_NAME,
            "extends": ["oAuth2Api"],
            "displayName": DISPLAY_NAME,
            "documentationUrl": DOCUMENTATION_URL,
            "properties": Self::properties(),
        })
    }
}

impl fmt::Debug for BlingOAuth2Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlingOAuth2Api")
            .field("grant_type", &self.grant_type)
            .field("auth_url", &self.auth_url)
            .field("access_token_url", &self.access_token_url)
            .field("scope", &self.scope)
            .field("authentication", &self.authentication)
            .field("client_id", &self.client_id)
            .field("client_secret", &"********")
            .finish()
    }
}

/// Tokens issued for a credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    /// Sent as Bearer token on API requests
    pub access_token: String,

    pub refresh_token: Option<String>,

    /// When the access token expires (UTC)
    pub expires_at: Option<DateTime<Utc>>,
}
