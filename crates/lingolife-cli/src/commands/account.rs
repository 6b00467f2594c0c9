//! The `register`, `login`, `logout` and `whoami` commands.

use anyhow::Result;

use crate::client::{ApiClient, AuthResponse};

use super::ClientContext;

pub async fn register(ctx: &ClientContext, username: &str, email: &str, password: &str) -> Result<()> {
    let client = ApiClient::new(&ctx.api_url, None)?;
    let auth = client.register(username, email, password).await?;
    remember(ctx, &auth)?;
    println!("{}: signed in as {} <{}>", auth.message, auth.user.username, auth.user.email);
    Ok(())
}

pub async fn login(ctx: &ClientContext, username: &str, password: &str) -> Result<()> {
    let client = ApiClient::new(&ctx.api_url, None)?;
    let auth = client.login(username, password).await?;
    remember(ctx, &auth)?;
    println!("{}: signed in as {}", auth.message, auth.user.username);
    Ok(())
}

fn remember(ctx: &ClientContext, auth: &AuthResponse) -> Result<()> {
    ctx.sessions().save(&auth.token, &auth.user)?;
    tracing::debug!(user_id = %auth.user.id, "session saved");
    Ok(())
}

pub fn logout(ctx: &ClientContext) -> Result<()> {
    match ctx.saved_session()? {
        Some(session) => {
            ctx.sessions().clear()?;
            println!("Signed out {}", session.user.username);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Show the saved user, verified against the server unless `offline`.
pub async fn whoami(ctx: &ClientContext, offline: bool) -> Result<()> {
    let Some(session) = ctx.saved_session()? else {
        println!("Not signed in (using the default user).");
        return Ok(());
    };
    if offline {
        println!("{} <{}> (id {})", session.user.username, session.user.email, session.user.id);
        return Ok(());
    }

    let client = ApiClient::new(&ctx.api_url, Some(session.token))?;
    match client.me().await {
        Ok(user) => {
            println!("{} <{}> (id {})", user.username, user.email, user.id);
            Ok(())
        }
        Err(e) if matches!(e.status(), Some(401 | 403)) => {
            ctx.sessions().clear()?;
            anyhow::bail!("saved session is no longer valid ({e}); please log in again")
        }
        Err(e) => Err(e.into()),
    }
}
