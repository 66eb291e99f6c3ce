use anyhow::{anyhow, bail, Context, Result};
use bling_connector::config::BlingConfig;
use bling_connector::credentials::{BlingOAuth2Api, CredentialStore};
use bling_connector::node::description::node_description;
use bling_connector::oauth::exchange_code_for_token;
use bling_connector::transport::{StaticToken, TokenSource};
use bling_connector::{BlingNode, Invocation, OAuth2HttpTransport};
use serde_json::json;
use std::io::Read;
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "usage:
  bling run                          read an invocation from stdin, print output records
  bling describe                     print node and credential descriptions
  bling authorize <redirect_uri>     print the Bling authorization URL
  bling exchange <code> <redirect_uri>  exchange an authorization code and store tokens";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries JSON output only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bling_connector=info,bling=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = BlingConfig::from_env()?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["run"] => run(&config).await,
        ["describe"] => describe(),
        ["authorize", redirect_uri] => authorize(redirect_uri),
        ["exchange", code, redirect_uri] => exchange(&config, code, redirect_uri).await,
        _ => bail!("{}", USAGE),
    }
}

async fn run(config: &BlingConfig) -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read invocation from stdin")?;
    let invocation: Invocation =
        serde_json::from_str(&input).context("Failed to parse invocation JSON")?;

    // BLING_ACCESS_TOKEN bypasses the credential store (sandbox/testing)
    let tokens: Arc<dyn TokenSource> = match std::env::var("BLING_ACCESS_TOKEN") {
        Ok(token) => Arc::new(StaticToken(token)),
        Err(_) => Arc::new(open_store(config)?),
    };
    let transport = OAuth2HttpTransport::new(tokens, config.api.timeout())?;

    let node = BlingNode::new(Arc::new(transport))
        .with_base_url(config.api.base_url.clone())
        .with_credential_name(config.credentials.name.clone());

    let records = node.run(invocation, config.batch.policy()).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn describe() -> Result<()> {
    let description = json!({
        "node": node_description(),
        "credential": BlingOAuth2Api::describe(),
    });
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

fn authorize(redirect_uri: &str) -> Result<()> {
    let credential = client_credential()?;
    let (url, state) = credential.authorization_url(redirect_uri);
    println!("{}", serde_json::to_string_pretty(&json!({ "url": url, "state": state }))?);
    Ok(())
}

async fn exchange(config: &BlingConfig, code: &str, redirect_uri: &str) -> Result<()> {
    let credential = client_credential()?;
    let store = open_store(config)?;

    let tokens = exchange_code_for_token(&credential, code, redirect_uri).await?;
    store.store(&config.credentials.name, &tokens)?;

    info!(
        credential = %config.credentials.name,
        expires_at = ?tokens.expires_at,
        "Tokens stored"
    );
    Ok(())
}

fn client_credential() -> Result<BlingOAuth2Api> {
    let client_id = std::env::var("BLING_CLIENT_ID").context("BLING_CLIENT_ID not set")?;
    let client_secret =
        std::env::var("BLING_CLIENT_SECRET").context("BLING_CLIENT_SECRET not set")?;
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(anyhow!("BLING_CLIENT_ID and BLING_CLIENT_SECRET must not be empty"));
    }
    Ok(BlingOAuth2Api::new(client_id, client_secret))
}

fn open_store(config: &BlingConfig) -> Result<CredentialStore> {
    let encryption_key = std::env::var("BLING_ENCRYPTION_KEY")
        .context("BLING_ENCRYPTION_KEY is required (base64-encoded 32-byte key)")?;
    CredentialStore::new(&config.credentials.database, &encryption_key)
        .context("Failed to open credential store")
}
