//! In-memory association of `(qr_id, session_id)` pairs with a CDC.

use dashmap::DashMap;

use crate::error::{ValidationError, normalize_credential, normalize_session};
use crate::identifier::QrId;

/// Two-part lookup key. The session half is always stored trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssociationKey {
    qr_id: QrId,
    session_id: String,
}

impl AssociationKey {
    pub fn new(qr_id: QrId, session_id: &str) -> Self {
        Self {
            qr_id,
            session_id: session_id.trim().to_string(),
        }
    }

    pub fn qr_id(&self) -> QrId {
        self.qr_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// A validated, normalized association ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Association {
    pub key: AssociationKey,
    pub credential: String,
}

impl Association {
    /// Validates the credential first, then the session token, and trims both.
    pub fn new(qr_id: QrId, session_id: &str, cdc_id: &str) -> Result<Self, ValidationError> {
        let credential = normalize_credential(cdc_id)?;
        let session_id = normalize_session(session_id)?;
        Ok(Self {
            key: AssociationKey::new(qr_id, session_id),
            credential: credential.to_string(),
        })
    }
}

/// Storage for associations. Every operation is atomic with respect to the others.
pub trait CredentialStore: Send + Sync + 'static {
    /// Inserts or overwrites, returning the credential previously stored under the key.
    fn store(&self, association: Association) -> Option<String>;

    /// Returns the credential stored under `key`, if any.
    fn lookup(&self, key: &AssociationKey) -> Option<String>;

    /// Number of stored associations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Entries live until the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<AssociationKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn store(&self, association: Association) -> Option<String> {
        self.entries.insert(association.key, association.credential)
    }

    fn lookup(&self, key: &AssociationKey) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(id: i64, session: &str) -> AssociationKey {
        AssociationKey::new(QrId::new(id), session)
    }

    #[test]
    fn store_then_lookup() {
        let store = MemoryStore::new();
        let previous = store.store(Association::new(QrId::new(42), "s1", "abc123").unwrap());
        assert_eq!(previous, None);
        assert_eq!(store.lookup(&key(42, "s1")).as_deref(), Some("abc123"));
    }

    #[test]
    fn last_write_wins() {
        let store = MemoryStore::new();
        store.store(Association::new(QrId::new(7), "s", "first").unwrap());
        let previous = store.store(Association::new(QrId::new(7), "s", "second").unwrap());
        assert_eq!(previous.as_deref(), Some("first"));
        assert_eq!(store.lookup(&key(7, "s")).as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn session_and_credential_are_trimmed() {
        let store = MemoryStore::new();
        store.store(Association::new(QrId::new(1), " abc ", "  cdc-9\n").unwrap());
        assert_eq!(store.lookup(&key(1, "abc")).as_deref(), Some("cdc-9"));
        assert_eq!(store.lookup(&key(1, " abc")).as_deref(), Some("cdc-9"));
    }

    #[test]
    fn unknown_key_is_absent() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.lookup(&key(99, "nobody")), None);
        store.store(Association::new(QrId::new(99), "somebody", "x").unwrap());
        assert_eq!(store.lookup(&key(99, "nobody")), None);
        assert_eq!(store.lookup(&key(98, "somebody")), None);
    }

    #[test]
    fn blank_fields_are_rejected_in_order() {
        assert_eq!(
            Association::new(QrId::new(1), "s", "").unwrap_err(),
            ValidationError::EmptyCredential
        );
        assert_eq!(
            Association::new(QrId::new(1), "   ", "   ").unwrap_err(),
            ValidationError::EmptyCredential
        );
        assert_eq!(
            Association::new(QrId::new(1), " \t", "cdc").unwrap_err(),
            ValidationError::EmptySessionToken
        );
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        let session = format!("t{t}");
                        store.store(Association::new(QrId::new(i), &session, "cdc").unwrap());
                        assert!(store.lookup(&key(i, &session)).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8 * 500);
    }
}
