//! ILS session handshake.
//!
//! `SessionAuthenticator` exchanges the configured staff credentials for a
//! session token through the request gate. A failed login is fatal for the
//! branch being processed.

mod session;
mod types;

pub use session::SessionAuthenticator;
pub use types::*;
