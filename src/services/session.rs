use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

pub const UNPROTECTED_WARNING: &str =
    "APP_PASSWORD is not set. This app will be accessible to anyone with the link.";

/// Shared-secret check in front of the upload flow
#[derive(Debug, Clone)]
pub struct AccessGate {
    secret_digest: Option<[u8; 32]>,
}

impl AccessGate {
    pub fn new(password: Option<&str>) -> Self {
        Self {
            secret_digest: password.map(digest),
        }
    }

    pub fn open() -> Self {
        Self::new(None)
    }

    pub fn is_protected(&self) -> bool {
        self.secret_digest.is_some()
    }

    /// Constant-time over the digests. An open gate accepts anything.
    pub fn verify(&self, candidate: &str) -> bool {
        match &self.secret_digest {
            None => true,
            Some(expected) => {
                let actual = digest(candidate);
                expected
                    .iter()
                    .zip(actual.iter())
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
            }
        }
    }

    pub fn warning(&self) -> Option<&'static str> {
        (!self.is_protected()).then_some(UNPROTECTED_WARNING)
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// An unlocked client
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Per-client unlock state, keyed by session token
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// A fresh session that is not stored; `create` records one.
    pub fn mint(&self) -> Session {
        let now = Utc::now();
        Session {
            token: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        }
    }

    pub fn create(&self) -> Session {
        let session = self.mint();
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Live session for `token`; an expired one is dropped on sight.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|s| s.value().clone())?;
        if session.is_expired(Utc::now()) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drops expired sessions, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        // Other threads may insert while shards are being swept.
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            let keep = !s.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    fn insert_raw(&self, session: Session) {
        self.sessions.insert(session.token.clone(), session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_gate() {
        let gate = AccessGate::open();
        assert!(!gate.is_protected());
        assert!(gate.verify("anything"));
        assert_eq!(gate.warning(), Some(UNPROTECTED_WARNING));
    }

    #[test]
    fn test_protected_gate() {
        let gate = AccessGate::new(Some("s3cret"));
        assert!(gate.is_protected());
        assert!(gate.verify("s3cret"));
        assert!(!gate.verify("s3cret "));
        assert!(!gate.verify("S3cret"));
        assert!(!gate.verify(""));
        assert!(gate.warning().is_none());
    }

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new(24);
        let session = store.create();
        assert_eq!(store.len(), 1);
        assert!(store.get(&session.token).is_some());
        assert!(store.get("unknown").is_none());

        assert!(store.remove(&session.token));
        assert!(store.get(&session.token).is_none());
        assert!(!store.remove(&session.token));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_sessions() {
        let store = SessionStore::new(24);
        let live = store.create();
        let past = Utc::now() - Duration::hours(1);
        store.insert_raw(Session {
            token: "stale".to_string(),
            created_at: past - Duration::hours(24),
            expires_at: past,
        });
        store.insert_raw(Session {
            token: "stale-2".to_string(),
            created_at: past - Duration::hours(24),
            expires_at: past,
        });

        assert!(store.get("stale").is_none());
        assert_eq!(store.len(), 2);

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&live.token).is_some());
    }

    #[test]
    fn test_purge_while_creating() {
        let store = std::sync::Arc::new(SessionStore::new(24));
        let past = Utc::now() - Duration::hours(1);
        for i in 0..100 {
            store.insert_raw(Session {
                token: format!("stale-{i}"),
                created_at: past - Duration::hours(24),
                expires_at: past,
            });
        }

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        store.create();
                    }
                })
            })
            .collect();

        let mut removed = 0;
        for _ in 0..2_000 {
            removed += store.purge_expired();
        }
        for writer in writers {
            writer.join().unwrap();
        }
        removed += store.purge_expired();

        assert_eq!(removed, 100);
        assert_eq!(store.len(), 8_000);
    }
}
