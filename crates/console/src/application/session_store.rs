//! SessionStore - authentication lifecycle and the persisted credential.
//!
//! The credential check is a stand-in for a real identity provider: a fixed
//! allow-list of demo accounts and an opaque token that is simply the
//! base64 of `username:millis:nonce`. It is reversible by design of the
//! placeholder and must not be treated as a security boundary.
//!
//! The session is the only state that survives a restart. It is written to
//! storage under [`PERSIST_KEY`] as `{ "session": ... }`.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use fixdesk_domain::{Role, Session, User, UserId};
use fixdesk_shared::{routes, RequestBody};

use super::busy::{BusyFlags, BusyGuard, BusyKey};
use super::sequencing::Settlements;
use super::{clear_error, record_failure, shared, AuthFailure, Shared, StoreError, StoreState};
use crate::ports::{ClockPort, CredentialProvider, RandomPort, RequestGateway, StorageProvider};

/// Storage key of the persisted root record.
pub const PERSIST_KEY: &str = "persist:root";

struct DemoAccount {
    username: &'static str,
    password: &'static str,
    role: Role,
}

static DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        username: "admin",
        password: "password",
        role: Role::Admin,
    },
    DemoAccount {
        username: "user",
        password: "123456",
        role: Role::User,
    },
    DemoAccount {
        username: "demo",
        password: "demo123",
        role: Role::Demo,
    },
];

fn find_account(username: &str) -> Option<&'static DemoAccount> {
    DEMO_ACCOUNTS.iter().find(|a| a.username == username)
}

fn user_for(account: &DemoAccount) -> User {
    User {
        id: UserId::new(account.username),
        username: account.username.to_string(),
        role: account.role,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Verifying,
    Authenticated,
    LoggingOut,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub status: SessionStatus,
    pub session: Option<Session>,
    pub error: Option<String>,
    pub busy: BusyFlags,
    settlements: Settlements,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && self.session.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(Session::username)
    }

    pub fn is_logging_in(&self) -> bool {
        self.busy.is_set(&BusyKey::new(LOGIN_KEY))
    }
}

impl StoreState for SessionState {
    fn busy_mut(&mut self) -> &mut BusyFlags {
        &mut self.busy
    }

    fn settlements_mut(&mut self) -> &mut Settlements {
        &mut self.settlements
    }

    fn error_mut(&mut self) -> &mut Option<String> {
        &mut self.error
    }
}

const LOGIN_KEY: &str = "login";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedRoot {
    #[serde(default)]
    session: Option<Session>,
}

pub struct SessionStore {
    state: Shared<SessionState>,
    storage: Arc<dyn StorageProvider>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    remote: Option<Arc<dyn RequestGateway>>,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            state: shared(),
            storage,
            clock,
            random,
            remote: None,
        }
    }

    /// Notify the remote on logout. Local state is cleared either way.
    pub fn with_remote(mut self, gateway: Arc<dyn RequestGateway>) -> Self {
        self.remote = Some(gateway);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Bearer credential source for the request gateway.
    pub fn credentials(&self) -> SessionCredentials {
        SessionCredentials {
            state: self.state.subscribe(),
        }
    }

    pub fn clear_error(&self) {
        clear_error(&self.state);
    }

    /// Check `username`/`password` against the account allow-list and mint
    /// a fresh token.
    ///
    /// A failed attempt records the error but leaves any existing session
    /// untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, StoreError> {
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(LOGIN_KEY));
        tracing::debug!(username, "Logging in");

        let account = find_account(username).filter(|a| a.password == password);
        let Some(account) = account else {
            return Err(record_failure(&self.state, AuthFailure::InvalidCredentials.into()));
        };

        let session = Session {
            user: user_for(account),
            token: self.mint_token(account.username),
        };
        self.establish(&session);
        tracing::info!(username, "Logged in");
        Ok(session)
    }

    /// Re-establish a session from a previously minted token.
    ///
    /// On failure the session is cleared and the persisted record removed.
    pub async fn verify(&self, token: &str) -> Result<Session, StoreError> {
        self.state.send_modify(|s| {
            s.status = SessionStatus::Verifying;
            s.error = None;
        });

        let Some(account) = token_username(token).and_then(|name| find_account(&name)) else {
            self.state.send_modify(|s| {
                s.status = SessionStatus::Anonymous;
                s.session = None;
            });
            self.storage.remove(PERSIST_KEY);
            return Err(record_failure(&self.state, AuthFailure::TokenRejected.into()));
        };

        let session = Session {
            user: user_for(account),
            token: token.to_string(),
        };
        self.establish(&session);
        tracing::info!(username = account.username, "Session verified");
        Ok(session)
    }

    /// Restore the persisted session, if any, by re-verifying its token.
    pub async fn restore(&self) -> Result<Option<Session>, StoreError> {
        let Some(raw) = self.storage.load(PERSIST_KEY) else {
            return Ok(None);
        };
        let root = match serde_json::from_str::<PersistedRoot>(&raw) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Discarding unreadable persisted session: {}", e);
                self.storage.remove(PERSIST_KEY);
                return Ok(None);
            }
        };
        match root.session {
            Some(session) => self.verify(&session.token).await.map(Some),
            None => Ok(None),
        }
    }

    /// End the session. Never fails: local state is cleared even when the
    /// remote notification does not go through.
    pub async fn logout(&self) {
        self.state.send_modify(|s| s.status = SessionStatus::LoggingOut);

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.post(routes::LOGOUT, RequestBody::empty()).await {
                tracing::warn!("Logout notification failed: {}", e);
            }
        }

        self.state.send_modify(|s| {
            s.status = SessionStatus::Anonymous;
            s.session = None;
            s.error = None;
        });
        self.storage.remove(PERSIST_KEY);
        tracing::info!("Logged out");
    }

    fn establish(&self, session: &Session) {
        self.state.send_modify(|s| {
            s.status = SessionStatus::Authenticated;
            s.session = Some(session.clone());
            s.error = None;
        });
        self.persist(session);
    }

    fn persist(&self, session: &Session) {
        let root = PersistedRoot {
            session: Some(session.clone()),
        };
        match serde_json::to_string(&root) {
            Ok(raw) => self.storage.save(PERSIST_KEY, &raw),
            Err(e) => tracing::error!("Failed to serialize session: {}", e),
        }
    }

    fn mint_token(&self, username: &str) -> String {
        let millis = self.clock.now().timestamp_millis();
        let nonce = to_base36(self.random.next_u64());
        STANDARD.encode(format!("{username}:{millis}:{nonce}"))
    }
}

/// Recover the username from a token minted by [`SessionStore::login`].
fn token_username(token: &str) -> Option<String> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let mut parts = text.splitn(3, ':');
    let username = parts.next().filter(|u| !u.is_empty())?;
    parts.next()?.parse::<i64>().ok()?;
    parts.next().filter(|nonce| !nonce.is_empty())?;
    Some(username.to_string())
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Reads the current token from the session snapshot.
#[derive(Clone)]
pub struct SessionCredentials {
    state: watch::Receiver<SessionState>,
}

impl CredentialProvider for SessionCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.state.borrow().session.as_ref().map(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::testing::MemoryStorage;
    use crate::ports::{GatewayError, MockRequestGateway};
    use chrono::{TimeZone, Utc};

    fn store(storage: Arc<MemoryStorage>) -> SessionStore {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        SessionStore::new(storage, Arc::new(FixedClock(now)), Arc::new(FixedRandom(1_234_567)))
    }

    #[tokio::test]
    async fn login_persists_and_restart_restores_the_session() {
        let storage = Arc::new(MemoryStorage::default());
        let first = store(storage.clone());

        let session = first.login("admin", "password").await.unwrap();
        assert!(first.snapshot().is_authenticated());
        assert_eq!(session.user.role, Role::Admin);
        assert!(storage.load(PERSIST_KEY).unwrap().contains("\"session\""));

        // Fresh process: everything but storage is new.
        let second = store(storage.clone());
        assert!(!second.snapshot().is_authenticated());

        let restored = second.restore().await.unwrap().unwrap();
        let state = second.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.username(), Some("admin"));
        assert_eq!(restored.token, session.token);
    }

    #[tokio::test]
    async fn tampered_token_fails_verification() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(storage.clone());
        let session = store.login("user", "123456").await.unwrap();

        let forged = STANDARD.encode("mallory:1705312800000:abc");
        let error = store.verify(&forged).await.unwrap_err();
        assert!(matches!(error, StoreError::Auth(AuthFailure::TokenRejected)));

        let state = store.snapshot();
        assert!(!state.is_authenticated());
        assert_eq!(state.error.as_deref(), Some("Token verification failed"));
        assert!(storage.load(PERSIST_KEY).is_none());

        let mut garbled = session.token.clone();
        garbled.insert(3, '!');
        assert!(store.verify(&garbled).await.is_err());
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn wrong_password_leaves_session_untouched() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(storage.clone());

        let error = store.login("admin", "hunter2").await.unwrap_err();
        assert!(matches!(error, StoreError::Auth(AuthFailure::InvalidCredentials)));

        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Anonymous);
        assert!(state.session.is_none());
        assert_eq!(state.error.as_deref(), Some("Invalid username or password"));
        assert!(!state.is_logging_in());
        assert!(storage.load(PERSIST_KEY).is_none());

        store.clear_error();
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn logout_clears_state_even_when_remote_fails() {
        let storage = Arc::new(MemoryStorage::default());
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_post()
            .withf(|path, _| path == routes::LOGOUT)
            .times(1)
            .returning(|_, _| Err(GatewayError::Transport("connection refused".into())));

        let store = store(storage.clone()).with_remote(Arc::new(gateway));
        store.login("demo", "demo123").await.unwrap();

        store.logout().await;

        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Anonymous);
        assert!(state.session.is_none());
        assert!(storage.load(PERSIST_KEY).is_none());
    }

    #[tokio::test]
    async fn credentials_follow_the_session() {
        let store = store(Arc::new(MemoryStorage::default()));
        let credentials = store.credentials();
        assert_eq!(credentials.bearer_token(), None);

        let session = store.login("admin", "password").await.unwrap();
        assert_eq!(credentials.bearer_token(), Some(session.token));

        store.logout().await;
        assert_eq!(credentials.bearer_token(), None);
    }

    #[test]
    fn token_encodes_username_timestamp_and_nonce() {
        let token = STANDARD.encode("admin:1705312800000:k2x9");
        assert_eq!(token_username(&token).as_deref(), Some("admin"));
        assert_eq!(token_username(&STANDARD.encode("admin")), None);
        assert_eq!(token_username("%%%"), None);
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
