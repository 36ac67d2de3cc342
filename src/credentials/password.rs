//! Salted one-way password hashing (bcrypt).
//!
//! Both operations are CPU bound and deliberately slow, so they run on the
//! blocking thread pool instead of stalling the async workers.

use anyhow::{anyhow, Context, Result};

/// Lowest cost accepted for production use.
pub const MIN_PRODUCTION_COST: u32 = 10;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Build a hasher with the given bcrypt cost.
    ///
    /// # Errors
    /// Returns an error if the cost is outside bcrypt's 4..=31 range.
    pub fn new(cost: u32) -> Result<Self> {
        if !(4..=31).contains(&cost) {
            return Err(anyhow!("bcrypt cost must be between 4 and 31, got {cost}"));
        }
        Ok(Self { cost })
    }

    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if the plaintext is longer than [`MAX_PASSWORD_BYTES`],
    /// the hashing task panics or bcrypt fails.
    pub async fn hash(&self, plaintext: &str) -> Result<String> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(anyhow!(
                "password exceeds {MAX_PASSWORD_BYTES} bytes and would be truncated"
            ));
        }
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .context("password hashing task failed")?
            .context("failed to hash password")
    }

    /// Check a plaintext against a stored digest. Plaintexts longer than
    /// [`MAX_PASSWORD_BYTES`] never match, since bcrypt would compare only a prefix.
    ///
    /// # Errors
    /// Returns an error if the stored digest is malformed.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest))
            .await
            .context("password verification task failed")?
            .context("failed to verify password against stored hash")
    }
}
