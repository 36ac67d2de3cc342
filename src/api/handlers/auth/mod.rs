//! Auth handlers and supporting modules.
//!
//! Login issues an HS256 session token; every route outside
//! [`gate::PUBLIC_ROUTES`] requires it as a bearer token. The reset endpoints
//! are public because a user who forgot the password cannot hold a session.
//!
//! ## Error responses
//!
//! - Login answers `401 Invalid credentials` for both unknown identifiers and
//!   wrong passwords. The logs keep the two cases apart.
//! - Reset request answers `404` for unknown emails and `502` when the email
//!   could not be delivered. The issued token stays valid in that case.
//! - Reset confirmation answers `404` for unknown or already used tokens.

pub mod gate;
pub mod login;
pub mod reset;
pub(crate) mod responses;
mod state;
pub(crate) mod types;

pub use gate::access_gate;
pub use responses::ErrorBody;
pub use state::{AuthConfig, AuthState};
