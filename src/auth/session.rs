use tokio::sync::watch;

use crate::error::Result;

use super::token::IdentityProvider;

/// The signed-in user as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub token: String,
}

/// Owns the current session and broadcasts every change to subscribers.
pub struct SessionHandle {
    tx: watch::Sender<Option<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Verifies `token` and makes it the current session.
    pub fn sign_in(&self, provider: &IdentityProvider, token: &str) -> Result<Session> {
        let claims = provider.verify(token)?;
        let session = Session {
            user_id: claims.sub,
            email: claims.email,
            token: token.to_string(),
        };
        self.tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
