// Identity half of the Firebase backend.
//
// Holds the current ID/refresh token pair and publishes the signed-in
// user on a watch channel, which doubles as the auth-state listener.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use moneyboard_api::{IdTokenGrant, IdentityClient};
use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::AuthUser;
use crate::provider::{AuthStateStream, IdentityProvider};

/// Refresh the ID token once it is this close to expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct Credentials {
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: Instant,
    is_anonymous: bool,
}

impl Credentials {
    fn from_grant(grant: IdTokenGrant) -> Self {
        Self {
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
            expires_at: Instant::now() + grant.expires_in,
            is_anonymous: grant.is_anonymous,
        }
    }

    fn needs_refresh(&self, now: Instant) -> bool {
        self.expires_at.saturating_duration_since(now) <= REFRESH_MARGIN
    }
}

pub struct FirebaseAuth {
    client: IdentityClient,
    state: watch::Sender<Option<AuthUser>>,
    credentials: Mutex<Option<Credentials>>,
}

impl FirebaseAuth {
    pub fn new(client: IdentityClient) -> Self {
        Self {
            client,
            state: watch::channel(None).0,
            credentials: Mutex::new(None),
        }
    }

    /// A valid ID token for the signed-in user, refreshing it first if it
    /// is about to expire. `None` when nobody is signed in.
    ///
    /// A rejected refresh token signs the user out.
    pub async fn id_token(&self) -> Result<Option<SecretString>, CoreError> {
        let mut credentials = self.credentials.lock().await;
        let Some(current) = credentials.as_ref() else {
            return Ok(None);
        };
        if !current.needs_refresh(Instant::now()) {
            return Ok(Some(current.id_token.clone()));
        }

        debug!("ID token near expiry, refreshing");
        let refreshed = self
            .client
            .refresh(&current.refresh_token, current.is_anonymous)
            .await;
        match refreshed {
            Ok(grant) => {
                let fresh = Credentials::from_grant(grant);
                let token = fresh.id_token.clone();
                *credentials = Some(fresh);
                Ok(Some(token))
            }
            Err(e) if e.is_auth_expired() => {
                warn!(error = %e, "refresh token rejected, signing out");
                *credentials = None;
                drop(credentials);
                self.state.send_replace(None);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn install(&self, grant: IdTokenGrant) -> AuthUser {
        let user = AuthUser::new(grant.local_id.clone(), grant.is_anonymous);
        *self.credentials.lock().await = Some(Credentials::from_grant(grant));
        self.state.send_replace(Some(user.clone()));
        user
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn on_auth_state_changed(&self) -> AuthStateStream {
        WatchStream::new(self.state.subscribe()).boxed()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    async fn sign_in_with_token(&self, token: &SecretString) -> Result<AuthUser, CoreError> {
        let grant = self.client.sign_in_with_custom_token(token).await?;
        Ok(self.install(grant).await)
    }

    async fn sign_in_anonymously(&self) -> Result<AuthUser, CoreError> {
        let grant = self.client.sign_up_anonymously().await?;
        Ok(self.install(grant).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(expires_in: Duration) -> Credentials {
        Credentials {
            id_token: SecretString::from("id"),
            refresh_token: SecretString::from("refresh"),
            expires_at: Instant::now() + expires_in,
            is_anonymous: true,
        }
    }

    #[tokio::test]
    async fn fresh_token_is_not_refreshed() {
        let creds = credentials(Duration::from_secs(3600));
        assert!(!creds.needs_refresh(Instant::now()));
    }

    #[tokio::test]
    async fn token_inside_margin_is_refreshed() {
        let creds = credentials(Duration::from_secs(30));
        assert!(creds.needs_refresh(Instant::now()));

        let expired = credentials(Duration::ZERO);
        assert!(expired.needs_refresh(Instant::now() + Duration::from_secs(5)));
    }
}
