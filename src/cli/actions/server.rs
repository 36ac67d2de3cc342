use crate::{
    api::{self, handlers::auth::AuthConfig},
    cli::telemetry,
    email::EmailConfig,
};
use anyhow::Result;
use secrecy::SecretString;
use std::fmt;
use tracing::debug;
use url::Url;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub jwt_expires_in_seconds: u64,
    pub bcrypt_cost: u32,
    pub frontend_base_url: String,
    pub email_api_url: Option<Url>,
    pub email_api_key: Option<SecretString>,
    pub email_sender: String,
    pub email_sender_name: String,
}

// The DSN may embed a password.
impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &"***")
            .field("jwt_expires_in_seconds", &self.jwt_expires_in_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("frontend_base_url", &self.frontend_base_url)
            .field("email_api_url", &self.email_api_url.as_ref().map(Url::as_str))
            .field("email_sender", &self.email_sender)
            .finish_non_exhaustive()
    }
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.jwt_secret.clone(), self.frontend_base_url.clone())
            .with_session_ttl_seconds(self.jwt_expires_in_seconds)
            .with_bcrypt_cost(self.bcrypt_cost)
    }

    fn email_config(&self) -> EmailConfig {
        EmailConfig::new(self.email_sender.clone(), self.email_sender_name.clone())
            .with_api_url(self.email_api_url.clone())
            .with_api_key(self.email_api_key.clone())
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is rejected or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("server args: {args:?}");

    let auth_config = args.auth_config();
    let email_config = args.email_config();

    let result = api::new(args.port, args.dsn, auth_config, email_config).await;

    telemetry::shutdown_tracer();

    result
}
