use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_EMAIL_API_URL: &str = "email-api-url";
pub const ARG_EMAIL_API_KEY: &str = "email-api-key";
pub const ARG_EMAIL_SENDER: &str = "email-sender";
pub const ARG_EMAIL_SENDER_NAME: &str = "email-sender-name";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL_API_URL)
                .long(ARG_EMAIL_API_URL)
                .help("Transactional email API endpoint; emails are only logged when unset")
                .env("VINCULO_EMAIL_API_URL")
                .requires(ARG_EMAIL_API_KEY),
        )
        .arg(
            Arg::new(ARG_EMAIL_API_KEY)
                .long(ARG_EMAIL_API_KEY)
                .help("API key sent in the api-key header")
                .env("VINCULO_EMAIL_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_EMAIL_SENDER)
                .long(ARG_EMAIL_SENDER)
                .help("Sender address for outgoing emails")
                .env("VINCULO_EMAIL_SENDER")
                .default_value("no-reply@vinculo.dev"),
        )
        .arg(
            Arg::new(ARG_EMAIL_SENDER_NAME)
                .long(ARG_EMAIL_SENDER_NAME)
                .help("Sender display name for outgoing emails")
                .env("VINCULO_EMAIL_SENDER_NAME")
                .default_value("Vinculo"),
        )
}

pub struct Options {
    pub api_url: Option<Url>,
    pub api_key: Option<SecretString>,
    pub sender: String,
    pub sender_name: String,
}

impl Options {
    /// Parse email arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API URL is not a valid URL.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Env vars set to "" reach us as empty strings.
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let api_url = get_non_empty(ARG_EMAIL_API_URL)
            .map(|value| {
                Url::parse(&value).with_context(|| format!("invalid --{ARG_EMAIL_API_URL}"))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            api_key: get_non_empty(ARG_EMAIL_API_KEY).map(SecretString::from),
            sender: get_non_empty(ARG_EMAIL_SENDER)
                .unwrap_or_else(|| "no-reply@vinculo.dev".to_string()),
            sender_name: get_non_empty(ARG_EMAIL_SENDER_NAME)
                .unwrap_or_else(|| "Vinculo".to_string()),
        })
    }
}
