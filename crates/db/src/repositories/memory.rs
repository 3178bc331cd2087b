use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{RepositoryError, SessionStore};

#[derive(Default)]
pub struct InMemorySessionStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: String) -> Result<(), RepositoryError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), blob);
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), RepositoryError> {
        let mut blobs = self.blobs.write().await;
        blobs.remove(key);
        Ok(())
    }
}
