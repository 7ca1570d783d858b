//! Sign-in state for the remote backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::supabase::RemoteError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("sign-in rejected: {0}")]
    Rejected(String),

    #[error("identity provider unavailable: {0}")]
    Provider(#[from] RemoteError),

    #[error("keyring error: {0}")]
    Keyring(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|t| t <= now_secs)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

/// What sign-up produced. Providers that require email confirmation return
/// a user without a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(User),
}

/// Remote identity service.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, credentials: &Credentials) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn sign_up(&self, credentials: &Credentials) -> impl Future<Output = Result<SignUpOutcome, AuthError>> + Send;

    fn sign_out(&self, session: &Session) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Holds the current session and publishes changes to it.
pub struct AuthGate<P> {
    provider: P,
    session: watch::Sender<Option<Session>>,
}

impl<P: IdentityProvider> AuthGate<P> {
    pub fn new(provider: P) -> Self {
        let (session, _) = watch::channel(None);
        Self { provider, session }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    /// Adopt a session obtained earlier, e.g. from the keyring.
    pub fn restore(&self, session: Session) {
        log::debug!("Restored session for user {}", session.user.id);
        self.session.send_replace(Some(session));
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let session = self.provider.sign_in(credentials).await?;
        log::info!("Signed in as {}", session.user.id);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, credentials: &Credentials, confirm_password: &str) -> Result<SignUpOutcome, AuthError> {
        credentials.validate()?;
        if credentials.password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        let outcome = self.provider.sign_up(credentials).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                log::info!("Signed up and signed in as {}", session.user.id);
                self.session.send_replace(Some(session.clone()));
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                log::info!("Signed up {}, waiting for email confirmation", user.id);
            }
        }
        Ok(outcome)
    }

    /// Ends the session locally even when the provider call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.session.send_replace(None) else {
            return Ok(());
        };
        if let Err(e) = self.provider.sign_out(&session).await {
            log::warn!("Remote sign-out failed: {}", e);
            return Err(e);
        }
        log::info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts a single password and counts calls.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub calls: AtomicUsize,
    }

    pub(crate) fn session(user_id: &str) -> Session {
        Session {
            access_token: format!("token-{user_id}"),
            refresh_token: None,
            expires_at: None,
            user: User { id: user_id.into(), email: Some("ola@example.com".into()) },
        }
    }

    impl IdentityProvider for FakeProvider {
        async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if credentials.password == "secret1" {
                Ok(session("u1"))
            } else {
                Err(AuthError::Rejected("Invalid login credentials".into()))
            }
        }

        async fn sign_up(&self, _credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SignUpOutcome::SignedIn(session("u2")))
        }

        async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn sign_in_publishes_session() {
        let gate = AuthGate::new(FakeProvider::default());
        let mut rx = gate.subscribe();
        assert!(gate.current_user().is_none());

        gate.sign_in(&Credentials::new("ola@example.com", "secret1")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|s| s.user.id.clone()), Some("u1".into()));

        gate.sign_out().await.unwrap();
        assert!(gate.current_session().is_none());
    }

    #[tokio::test]
    async fn rejected_sign_in_keeps_signed_out() {
        let gate = AuthGate::new(FakeProvider::default());
        let err = gate.sign_in(&Credentials::new("ola@example.com", "nope")).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        assert!(!gate.is_authenticated());
    }

    #[tokio::test]
    async fn sign_up_validates_before_calling_provider() {
        let gate = AuthGate::new(FakeProvider::default());
        let creds = Credentials::new("ola@example.com", "abc");
        assert!(matches!(gate.sign_up(&creds, "abd").await, Err(AuthError::PasswordMismatch)));
        assert!(matches!(gate.sign_up(&creds, "abc").await, Err(AuthError::PasswordTooShort)));
        assert!(matches!(
            gate.sign_up(&Credentials::new("", "secret1"), "secret1").await,
            Err(AuthError::MissingCredentials)
        ));
        assert_eq!(gate.provider().calls.load(Ordering::SeqCst), 0);

        let creds = Credentials::new("ola@example.com", "secret1");
        gate.sign_up(&creds, "secret1").await.unwrap();
        assert_eq!(gate.current_user().unwrap().id, "u2");
    }
}
