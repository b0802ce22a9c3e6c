use std::sync::Arc;

use tracing::{debug, error};

use crate::gate::RequestGate;
use crate::ils::{IlsApi, IlsError};

use super::types::{Credentials, Session};

/// Obtains ILS sessions through the request gate.
pub struct SessionAuthenticator {
    api: Arc<dyn IlsApi>,
    gate: Arc<RequestGate>,
}

impl SessionAuthenticator {
    pub fn new(api: Arc<dyn IlsApi>, gate: Arc<RequestGate>) -> Self {
        Self { api, gate }
    }

    /// Log in with the given credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, IlsError> {
        let token = self
            .gate
            .call("login", || {
                self.api
                    .login(&credentials.username, &credentials.password)
            })
            .await
            .inspect_err(|e| error!(username = %credentials.username, error = %e, "ILS login failed"))?;

        if token.is_empty() {
            return Err(IlsError::LoginFailed("empty session token".to_string()));
        }

        debug!(backend = self.api.name(), "ILS session established");
        Ok(Session::new(token))
    }
}
