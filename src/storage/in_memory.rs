use super::PostStore;
use crate::error::Result;
use crate::report::TitlePattern;
use crate::types::Post;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory storage implementation for development/testing.
///
/// Keeps insertion order, which stands in for the store's natural order.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    posts: Arc<Mutex<Vec<Post>>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Arc::new(Mutex::new(posts)),
        }
    }

    /// Copy of everything currently stored.
    pub fn snapshot(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn delete_all(&self) -> Result<u64> {
        let mut posts = self.posts.lock().unwrap();
        let deleted = posts.len() as u64;
        posts.clear();
        debug!("Deleted {} posts", deleted);
        Ok(deleted)
    }

    async fn insert_many(&self, new_posts: &[Post]) -> Result<u64> {
        let mut posts = self.posts.lock().unwrap();
        posts.extend_from_slice(new_posts);
        debug!("Inserted {} posts", new_posts.len());
        Ok(new_posts.len() as u64)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.posts.lock().unwrap().len() as u64)
    }

    async fn view_counts(&self) -> Result<Vec<i64>> {
        let posts = self.posts.lock().unwrap();
        Ok(posts.iter().map(|p| p.view_count).collect())
    }

    async fn find_by_title(&self, pattern: &TitlePattern) -> Result<Vec<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .filter(|p| pattern.matches(&p.title))
            .cloned()
            .collect())
    }

    async fn close(&self) {}
}
