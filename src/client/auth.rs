//! Sign-up and sign-in.
//!
//! Registration is two-step. [`AuthStore::register`] mails a one-time code
//! and parks the registration in memory; [`AuthStore::verify_code`] creates
//! the account with the API and signs in. Only a signed-in session is ever
//! mirrored to disk.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use validator::Validate;

use super::local::{self, LocalCache};
use super::remote::{Remote, Session};
use super::{shared, Shared, StoreState};
use crate::domain::value_objects::VerificationCode;
use crate::domain::{Credentials, PublicUser, Registration};
use crate::error::{ClientError, ClientResult, VerificationError};

#[derive(Clone, Debug, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    PendingVerification { registration: Registration, code: VerificationCode },
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingVerification { .. })
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct AuthStore {
    remote: Option<Arc<dyn Remote>>,
    cache: LocalCache,
    state: Shared<AuthState>,
}

impl AuthStore {
    pub fn new(remote: Option<Arc<dyn Remote>>, cache: LocalCache) -> Self {
        Self { remote, cache, state: shared(AuthState::Anonymous) }
    }

    pub async fn snapshot(&self) -> StoreState<AuthState> {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<PublicUser> {
        self.state.read().await.data.session().map(|s| s.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.data.session().map(|s| s.token.clone())
    }

    pub async fn is_admin(&self) -> bool {
        self.state.read().await.data.session().is_some_and(|s| s.user.is_admin)
    }

    /// Picks up a mirrored session from a previous run.
    pub async fn restore(&self) -> bool {
        let session: Option<Session> = self.cache.restore(local::SESSION).await;
        let mut state = self.state.write().await;
        let restored = session.is_some();
        state.settle(session.map_or(AuthState::Anonymous, AuthState::Authenticated));
        restored
    }

    fn remote(&self) -> ClientResult<&Arc<dyn Remote>> {
        self.remote.as_ref().ok_or(ClientError::NoApi)
    }

    async fn record<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(e) = &result {
            self.state.write().await.fail(e);
        }
        result
    }

    /// Sends a fresh code and moves to pending verification. A failed send
    /// leaves the state as it was.
    pub async fn register(&self, registration: Registration) -> ClientResult<()> {
        let result = self.try_register(registration, Utc::now()).await;
        self.record(result).await
    }

    async fn try_register(&self, registration: Registration, now: DateTime<Utc>) -> ClientResult<()> {
        registration.validate()?;
        let code = VerificationCode::generate(now);
        self.remote()?.send_verification_code(&registration.email, code.code()).await?;
        info!(email = %registration.email, "verification code sent");
        let mut state = self.state.write().await;
        state.error = None;
        state.data = AuthState::PendingVerification { registration, code };
        Ok(())
    }

    /// Issues a new code for the pending registration, restarting its clock.
    pub async fn resend_code(&self) -> ClientResult<()> {
        let result = self.try_resend(Utc::now()).await;
        self.record(result).await
    }

    async fn try_resend(&self, now: DateTime<Utc>) -> ClientResult<()> {
        let AuthState::PendingVerification { registration, .. } = self.state.read().await.data.clone() else {
            return Err(VerificationError::NothingPending.into());
        };
        let code = VerificationCode::generate(now);
        self.remote()?.send_verification_code(&registration.email, code.code()).await?;
        self.state.write().await.data = AuthState::PendingVerification { registration, code };
        Ok(())
    }

    pub async fn verify_code(&self, input: &str) -> ClientResult<PublicUser> {
        self.verify_code_at(input, Utc::now()).await
    }

    /// An expired code drops the registration; a wrong one keeps it pending
    /// for another try. A matching code registers and signs in.
    pub async fn verify_code_at(&self, input: &str, now: DateTime<Utc>) -> ClientResult<PublicUser> {
        let result = self.try_verify(input, now).await;
        self.record(result).await
    }

    async fn try_verify(&self, input: &str, now: DateTime<Utc>) -> ClientResult<PublicUser> {
        let AuthState::PendingVerification { registration, code } = self.state.read().await.data.clone() else {
            return Err(VerificationError::NothingPending.into());
        };
        if let Err(e) = code.check(input, now) {
            if e == VerificationError::Expired {
                self.state.write().await.data = AuthState::Anonymous;
            }
            return Err(e.into());
        }
        let remote = self.remote()?;
        let session = match remote.register(&registration).await {
            Ok(session) => session,
            // An earlier attempt created the account but never heard back.
            Err(ClientError::Server { status: 400, .. }) => {
                let credentials = Credentials { email: registration.email, password: registration.password };
                remote.login(&credentials).await?
            }
            Err(e) => return Err(e),
        };
        self.sign_in(session).await
    }

    pub async fn login(&self, credentials: Credentials) -> ClientResult<PublicUser> {
        let result = match self.remote() {
            Ok(remote) => remote.login(&credentials).await,
            Err(e) => Err(e),
        };
        match self.record(result).await {
            Ok(session) => self.sign_in(session).await,
            Err(e) => {
                warn!(email = %credentials.email, error = %e, "login failed");
                Err(e)
            }
        }
    }

    async fn sign_in(&self, session: Session) -> ClientResult<PublicUser> {
        self.cache.mirror(local::SESSION, &session).await;
        let user = session.user.clone();
        info!(user_id = %user.id, admin = user.is_admin, "signed in");
        self.state.write().await.settle(AuthState::Authenticated(session));
        Ok(user)
    }

    pub async fn logout(&self) {
        if let Err(e) = self.cache.remove(local::SESSION).await {
            warn!(error = %e, "could not clear mirrored session");
        }
        let mut state = self.state.write().await;
        state.error = None;
        state.settle(AuthState::Anonymous);
    }
}
