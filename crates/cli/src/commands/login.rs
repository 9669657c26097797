//! `cmctl login`

use anyhow::Result;

use crate::client::authenticate;
use crate::config::Config;
use crate::output::print_success;

/// Authenticate against the identity service and save the token
pub async fn login(identity_url: &str, username: &str, password: &str) -> Result<()> {
    let token = authenticate(identity_url, username, password).await?;

    let mut config = Config::load()?;
    config.token = Some(token);
    config.identity_url = Some(identity_url.to_string());
    let path = config.save()?;

    print_success(&format!("Logged in as {username} (token saved to {})", path.display()));
    Ok(())
}
