//! Authenticated caller context.
//!
//! Credentials are passed explicitly to whatever needs them — there is no
//! ambient client or global session. Anything that talks to the store takes
//! a [`Session`] at construction, which keeps auth visible at call sites and
//! trivially fakeable in tests.

use std::fmt;
use uuid::Uuid;

/// Credentials and identity for one authenticated caller.
#[derive(Clone)]
pub struct Session {
    /// Bearer token sent with every store request.
    pub access_token: String,
    /// Authenticated user id, when known. Required for owner-scoped keys.
    pub user_id: Option<Uuid>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

// Tokens must not leak through logs or error chains
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
