//! # Vinculo (authentication and credential lifecycle)
//!
//! `vinculo` verifies who is calling the administrative backend and manages the
//! life of their password.
//!
//! ## Login
//!
//! Users sign in with a document number or a username plus a password. Passwords
//! are stored as bcrypt digests; a successful login returns the public user
//! projection and a signed session token (HS256 JWT with `iat`/`exp`).
//!
//! ## Password reset
//!
//! A reset request stores a fresh UUID v4 in the user's record, overwriting any
//! previous one, and emails a link to the frontend. Confirming the reset swaps the
//! password hash and clears the token in a single conditional update, so a token
//! works at most once even under concurrent confirmations.
//!
//! ## Access Gate
//!
//! Every route not on the public allowlist requires `Authorization: Bearer <token>`.
//! The gate verifies signature and expiry and hands the decoded claims to the
//! handler.

pub mod api;
pub mod cli;
pub mod credentials;
pub mod email;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
