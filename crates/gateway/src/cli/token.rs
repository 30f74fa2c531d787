//! `hub-gateway token ...`: operator tooling around the token codec.

use anyhow::Context;

use hub_domain::config::Config;
use hub_domain::identity::{AccessLevel, Identity};
use hub_tokens::TokenCodec;

use crate::login::links;

/// Tokens printed here are only useful when the server shares the secret,
/// so a missing secret is an error rather than a random fallback.
fn codec(config: &Config) -> anyhow::Result<TokenCodec> {
    let secret = std::env::var(&config.auth.secret_env)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .with_context(|| format!("${} must be set to issue or inspect tokens", config.auth.secret_env))?;
    Ok(TokenCodec::new(secret))
}

pub fn issue(
    config: &Config,
    email: &str,
    client_code: &str,
    first_name: &str,
    access: &str,
    job: Option<&str>,
) -> anyhow::Result<()> {
    let access: AccessLevel = access.parse()?;
    let identity = Identity::new(email, client_code, first_name, access);
    let token = codec(config)?
        .encode(&identity, config.auth.token_ttl())
        .context("encoding token")?;

    let base = config.server.public_base();
    println!("token: {token}");
    println!("login: {}", links::magic_link_url(base, &token));
    if let Some(job) = job {
        let link = links::deep_link_url(base, job, &token)
            .with_context(|| format!("invalid job number: {job:?}"))?;
        println!("job:   {link}");
    }
    Ok(())
}

pub fn inspect(config: &Config, token: &str) -> anyhow::Result<()> {
    let record = codec(config)?
        .decode(token)
        .map_err(|e| anyhow::anyhow!("token rejected: {e}"))?;

    println!("email:        {}", record.identity.email);
    println!("first name:   {}", record.identity.first_name);
    println!("client code:  {}", record.identity.client_code);
    println!("access level: {}", record.identity.access_level);
    match record.expires_at_utc() {
        Some(at) => println!("expires at:   {}", at.to_rfc3339()),
        None => println!("expires at:   {}", record.expires_at),
    }
    Ok(())
}
