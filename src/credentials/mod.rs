//! Credential lifecycle: password login and password reset.
//!
//! Nothing here knows about HTTP. The API layer wires these services together
//! once at startup and maps [`AuthError`] onto responses.
//!
//! - [`PasswordHasher`]: bcrypt hashing and verification off the async workers.
//! - [`TokenIssuer`]: HS256 session tokens with `exp`, random v4 reset tokens.
//! - [`Authenticator`]: identifier + password -> session token.
//! - [`ResetCoordinator`]: reset request (issue, persist, notify) and confirmation.
//! - [`CredentialStore`]: persistence seam, `PostgreSQL` or in-memory.

pub mod authenticator;
pub mod error;
pub mod memory;
pub mod models;
pub mod password;
pub mod postgres;
pub mod reset;
pub mod store;
pub mod token;

pub use authenticator::{Authenticator, LoginOutcome};
pub use error::{AuthError, Lookup};
pub use memory::MemoryCredentialStore;
pub use models::{CredentialRecord, NewCredential, Role, UserProjection};
pub use password::PasswordHasher;
pub use postgres::PgCredentialStore;
pub use reset::ResetCoordinator;
pub use store::{CredentialStore, InsertOutcome, ResetAssignment};
pub use token::{Claims, TokenIssuer};
