use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::registration::repo_types::{NewUser, UserId, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence for registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the `users` table if it is absent. Must be safe to call on
    /// every request.
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    /// Insert one row in a single statement, returning its id.
    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError>;
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<UserRecord>>;
    async fn count(&self) -> anyhow::Result<i64>;
}

/// In-process store with the same column limits and case-insensitive email
/// uniqueness as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        if let Some((column, limit)) = user.oversized_column() {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "value too long for {column} (limit {limit} characters)"
            )));
        }
        let email = user.email.to_lowercase();
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.email.to_lowercase() == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = rows.last().map_or(1, |r| r.id + 1);
        rows.push(UserRecord::from_new(id, user, OffsetDateTime::now_utc()));
        Ok(id)
    }

    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<UserRecord>> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.rows.lock().await.len() as i64)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            username: "ann-lee".into(),
            email: email.into(),
            password: "pw".into(),
            age: "30".into(),
            phone: "+1 1234567890".into(),
            address: "1 Rd".into(),
            city: "NYC".into(),
        }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let store = MemoryUserStore::new();
        assert_eq!(store.insert(sample_user("a@x.com")).await.unwrap(), 1);
        assert_eq!(store.insert(sample_user("b@x.com")).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_leaves_no_row() {
        let store = MemoryUserStore::new();
        store.insert(sample_user("a@x.com")).await.unwrap();
        let err = store.insert(sample_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let store = MemoryUserStore::new();
        store.insert(sample_user("ann@x.com")).await.unwrap();
        let err = store.insert(sample_user("ANN@X.COM")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn values_longer_than_their_column_are_refused() {
        let store = MemoryUserStore::new();
        let mut user = sample_user("a@x.com");
        user.age = "1234".into();
        let err = store.insert(user).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let mut user = sample_user("a@x.com");
        user.phone = "+1234 123456789012345".into();
        assert!(store.insert(user).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ensure_schema_is_repeatable() {
        let store = MemoryUserStore::new();
        store.ensure_schema().await.unwrap();
        store.insert(sample_user("a@x.com")).await.unwrap();
        store.ensure_schema().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_by_id_returns_stored_fields() {
        let store = MemoryUserStore::new();
        let id = store.insert(sample_user("a@x.com")).await.unwrap();
        let row = store.find_by_id(id).await.unwrap().expect("row exists");
        assert_eq!(row.to_new_user(), sample_user("a@x.com"));
        assert!(store.find_by_id(id + 1).await.unwrap().is_none());
    }
}
