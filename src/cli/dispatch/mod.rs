//! Maps validated CLI matches to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, email};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        jwt_expires_in_seconds: auth_opts.jwt_expires_in_seconds,
        bcrypt_cost: auth_opts.bcrypt_cost,
        frontend_base_url: auth_opts.frontend_base_url,
        email_api_url: email_opts.api_url,
        email_api_key: email_opts.api_key,
        email_sender: email_opts.sender,
        email_sender_name: email_opts.sender_name,
    }))
}
