//! OAuth 2.0 authorization-code flow for the Bling credential.
//!
//! 1. `BlingOAuth2Api::authorization_url` → user opens it and approves the app
//! 2. Bling redirects to the callback with `code` and `state`
//! 3. [`exchange_code_for_token`] trades the code for tokens
//! 4. Tokens go into the `CredentialStore` for the HTTP transport

mod exchange;

pub use exchange::exchange_code_for_token;
