use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::credentials::password::MIN_PRODUCTION_COST;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_EXPIRES_IN_SECONDS: &str = "jwt-expires-in-seconds";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens (HS256)")
                .env("VINCULO_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_JWT_EXPIRES_IN_SECONDS)
                .long(ARG_JWT_EXPIRES_IN_SECONDS)
                .help("Session token TTL in seconds")
                .env("VINCULO_JWT_EXPIRES_IN_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor for stored passwords")
                .env("VINCULO_BCRYPT_COST")
                .default_value("10")
                .value_parser(clap::value_parser!(u32).range(i64::from(MIN_PRODUCTION_COST)..=31)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for reset links and CORS")
                .env("VINCULO_FRONTEND_BASE_URL")
                .default_value("https://vinculo.dev"),
        )
}

pub struct Options {
    pub jwt_secret: SecretString,
    pub jwt_expires_in_seconds: u64,
    pub bcrypt_cost: u32,
    pub frontend_base_url: String,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let jwt_secret = match matches.get_one::<String>(ARG_JWT_SECRET) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.clone()),
            _ => anyhow::bail!("missing required argument: --{ARG_JWT_SECRET}"),
        };

        Ok(Self {
            jwt_secret,
            jwt_expires_in_seconds: matches
                .get_one::<u64>(ARG_JWT_EXPIRES_IN_SECONDS)
                .copied()
                .unwrap_or(3600),
            bcrypt_cost: matches
                .get_one::<u32>(ARG_BCRYPT_COST)
                .copied()
                .unwrap_or(MIN_PRODUCTION_COST),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "https://vinculo.dev".to_string()),
        })
    }
}
