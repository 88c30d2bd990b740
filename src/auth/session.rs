//! In-memory session store behind the session cookie.
//!
//! Records are keyed by a SHA-256 digest of the cookie value peppered with the
//! server secret; raw session identifiers are only ever handed to the cookie.
//! Each record sits behind its own async mutex, so concurrent reads of a stale
//! session share a single refresh call: the first reader refreshes, the others
//! wait and observe the fresh token.

use super::{
    error::Error,
    now_unix_seconds,
    refresh::{self, Outcome, TokenState},
    types::{Session, User},
    verify::VerifiedUser,
    AuthConfig, Backend,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use std::{collections::HashMap, sync::Arc, time::Duration};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::interval,
};
use tracing::{debug, info, instrument};

const SESSION_ID_BYTES: usize = 32;

struct SessionRecord {
    user: User,
    tokens: TokenState,
    last_seen: i64,
}

pub struct SessionStore {
    config: AuthConfig,
    backend: Backend,
    records: RwLock<HashMap<Vec<u8>, Arc<Mutex<SessionRecord>>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(config: AuthConfig, backend: Backend) -> Self {
        Self {
            config,
            backend,
            records: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Create a session for a verified user and return its cookie identifier.
    ///
    /// # Errors
    /// Returns an error if the OS random generator fails.
    pub async fn create(&self, verified: VerifiedUser) -> Result<(String, Session), Error> {
        self.create_at(verified, now_unix_seconds()).await
    }

    /// # Errors
    /// Returns an error if the OS random generator fails.
    #[instrument(skip_all, fields(user_id = %verified.user.id))]
    pub async fn create_at(
        &self,
        verified: VerifiedUser,
        now: i64,
    ) -> Result<(String, Session), Error> {
        let session_id = generate_session_id()?;
        let record = SessionRecord {
            user: verified.user,
            tokens: TokenState::new(verified.session_token, verified.refresh_token, now),
            last_seen: now,
        };
        let session = self.view(&record, now);

        self.records
            .write()
            .await
            .insert(self.key(&session_id), Arc::new(Mutex::new(record)));

        info!("Session created");

        Ok((session_id, session))
    }

    /// Current session for `session_id`, refreshed first when stale.
    ///
    /// A session whose refresh failed is still returned, carrying its error tag.
    pub async fn read(&self, session_id: &str) -> Option<Session> {
        self.read_at(session_id, now_unix_seconds()).await
    }

    pub async fn read_at(&self, session_id: &str, now: i64) -> Option<Session> {
        self.refresh_if_stale_at(session_id, now).await.ok()
    }

    /// # Errors
    /// Returns `Error::UnknownSession` when there is no live session for the id.
    pub async fn refresh_if_stale(&self, session_id: &str) -> Result<Session, Error> {
        self.refresh_if_stale_at(session_id, now_unix_seconds()).await
    }

    /// # Errors
    /// Returns `Error::UnknownSession` when there is no live session for the id.
    #[instrument(skip_all)]
    pub async fn refresh_if_stale_at(&self, session_id: &str, now: i64) -> Result<Session, Error> {
        let key = self.key(session_id);

        let record = self
            .records
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(Error::UnknownSession)?;

        let mut record = record.lock().await;

        if self.is_idle(&record, now) {
            drop(record);
            self.records.write().await.remove(&key);

            debug!("Session expired after inactivity");

            return Err(Error::UnknownSession);
        }

        match refresh::refresh_if_stale(&self.backend, &mut record.tokens, now).await {
            Outcome::Fresh => {}
            Outcome::Refreshed => debug!("Session tokens rotated"),
            Outcome::Invalidated(error) => debug!("Session invalidated: {}", error.as_str()),
        }

        record.last_seen = now;

        Ok(self.view(&record, now))
    }

    /// Remove a session; returns whether it existed.
    #[instrument(skip_all)]
    pub async fn destroy(&self, session_id: &str) -> bool {
        let removed = self
            .records
            .write()
            .await
            .remove(&self.key(session_id))
            .is_some();

        if removed {
            info!("Session destroyed");
        }

        removed
    }

    /// Drop sessions idle for longer than the session max-age. Records locked
    /// by an in-flight read are left alone.
    pub async fn prune_at(&self, now: i64) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();

        records.retain(|_, record| {
            record
                .try_lock()
                .map_or(true, |record| !self.is_idle(&record, now))
        });

        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Spawn the background sweeper that prunes idle sessions every `period`.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);

            loop {
                ticker.tick().await;

                let pruned = self.prune_at(now_unix_seconds()).await;
                if pruned > 0 {
                    info!("Pruned {} idle sessions", pruned);
                }
            }
        })
    }

    fn is_idle(&self, record: &SessionRecord, now: i64) -> bool {
        now - record.last_seen > self.config.session_max_age_seconds()
    }

    fn key(&self, session_id: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.config.secret().expose_secret().as_bytes());
        hasher.update(b":");
        hasher.update(session_id.as_bytes());
        hasher.finalize().to_vec()
    }

    fn view(&self, record: &SessionRecord, now: i64) -> Session {
        Session {
            user: record.user.clone(),
            session_token: record.tokens.access_token.clone(),
            refresh_token: record.tokens.refresh_token.clone(),
            access_token_expires: record.tokens.access_token_expires,
            expires: rfc3339(now + self.config.session_max_age_seconds()),
            error: record.tokens.error,
        }
    }
}

/// Random cookie value, base64url without padding.
fn generate_session_id() -> Result<String, Error> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn rfc3339(unix_seconds: i64) -> String {
    OffsetDateTime::from_unix_timestamp(unix_seconds)
        .ok()
        .and_then(|datetime| datetime.format(&Rfc3339).ok())
        .unwrap_or_default()
}
