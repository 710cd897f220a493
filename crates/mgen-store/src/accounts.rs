//! Account store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use mgen_models::{User, UserId};

use crate::error::{StoreError, StoreResult};
use crate::password::{hash_password, verify_password, DEFAULT_HASH_ROUNDS};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Register a user. Duplicate emails are a [`StoreError::Conflict`].
    async fn create(&self, email: &str, name: &str, password: &str) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// The user when `password` matches, else `None`.
    async fn verify_password(&self, email: &str, password: &str) -> StoreResult<Option<User>>;
}

struct Account {
    user: User,
    password_hash: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Accounts held in memory, keyed by normalized email.
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
    hash_rounds: u32,
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            hash_rounds: DEFAULT_HASH_ROUNDS,
        }
    }
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// PBKDF2 rounds for newly hashed passwords.
    pub fn with_hash_rounds(mut self, rounds: u32) -> Self {
        self.hash_rounds = rounds.max(1);
        self
    }
}

/// PBKDF2 is CPU-bound; keep it off the async workers.
async fn blocking<T, F>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::hash_failed(e.to_string()))?
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, email: &str, name: &str, password: &str) -> StoreResult<User> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(StoreError::invalid("email is empty"));
        }

        if self.accounts.read().await.contains_key(&email) {
            return Err(StoreError::conflict(format!("user {}", email)));
        }

        let password = password.to_string();
        let rounds = self.hash_rounds;
        let password_hash = blocking(move || hash_password(&password, rounds)).await?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(StoreError::conflict(format!("user {}", email)));
        }

        let user = User {
            id: UserId::new(),
            email: email.clone(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        accounts.insert(
            email,
            Account {
                user: user.clone(),
                password_hash,
            },
        );

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(&normalize_email(email))
            .map(|a| a.user.clone()))
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| &a.user.id == id)
            .map(|a| a.user.clone()))
    }

    async fn verify_password(&self, email: &str, password: &str) -> StoreResult<Option<User>> {
        let found = self
            .accounts
            .read()
            .await
            .get(&normalize_email(email))
            .map(|a| (a.user.clone(), a.password_hash.clone()));
        let Some((user, stored)) = found else {
            return Ok(None);
        };

        let password = password.to_string();
        let matches = blocking(move || Ok(verify_password(&password, &stored))).await?;
        Ok(matches.then_some(user))
    }
}
