//! User directory collaborator.
//!
//! The gate resolves bearer tokens and permission membership through this
//! trait; the backing store (relational database, cache, remote service)
//! is the embedding application's concern. `InMemoryDirectory` is the
//! implementation used by the demo binary and the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// SHA-256 digest of a plaintext bearer token.
pub type TokenHash = [u8; 32];

/// Hash a plaintext token for directory lookup.
///
/// Only token hashes cross the collaborator boundary; the plaintext never
/// leaves the authenticator.
pub fn hash_token(token: &str) -> TokenHash {
    Sha256::digest(token.as_bytes()).into()
}

/// Resolved identity record for an authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    /// False until the account confirms registration.
    pub activated: bool,
}

/// Failures surfaced by directory lookups.
///
/// `Unavailable` is kept distinct from `NotFound`: a store outage must
/// surface as a server fault, never as a bad credential.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no user matches the supplied token")]
    NotFound,

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup interface consumed by the authentication and authorization
/// middleware.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a token hash to a user record.
    async fn find_user_by_token(&self, token_hash: &TokenHash) -> Result<User, DirectoryError>;

    /// True iff the user holds the permission code.
    async fn user_has_permission(&self, user_id: u64, code: &str) -> bool;
}

/// Map-backed directory for tests and the demo binary.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<TokenHash, User>>,
    permissions: Mutex<HashMap<u64, HashSet<String>>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user reachable via `token`, holding `permission_codes`.
    pub fn insert_user(&self, token: &str, user: User, permission_codes: &[&str]) {
        let codes = permission_codes.iter().map(|c| c.to_string()).collect();
        self.permissions
            .lock()
            .expect("directory mutex poisoned")
            .insert(user.id, codes);
        self.users
            .lock()
            .expect("directory mutex poisoned")
            .insert(hash_token(token), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user_by_token(&self, token_hash: &TokenHash) -> Result<User, DirectoryError> {
        self.users
            .lock()
            .expect("directory mutex poisoned")
            .get(token_hash)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn user_has_permission(&self, user_id: u64, code: &str) -> bool {
        self.permissions
            .lock()
            .expect("directory mutex poisoned")
            .get(&user_id)
            .is_some_and(|codes| codes.contains(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: 1,
            name: "alice".to_string(),
            activated: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_hit_and_miss() {
        let directory = InMemoryDirectory::new();
        directory.insert_user("alice-token", alice(), &["movies:read"]);

        let found = directory
            .find_user_by_token(&hash_token("alice-token"))
            .await
            .unwrap();
        assert_eq!(found, alice());

        let missing = directory.find_user_by_token(&hash_token("other-token")).await;
        assert!(matches!(missing, Err(DirectoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_permission_membership() {
        let directory = InMemoryDirectory::new();
        directory.insert_user("alice-token", alice(), &["movies:read"]);

        assert!(directory.user_has_permission(1, "movies:read").await);
        assert!(!directory.user_has_permission(1, "movies:write").await);
        assert!(!directory.user_has_permission(99, "movies:read").await);
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
