pub mod in_memory;
#[cfg(feature = "db")]
pub mod mongo;

pub use in_memory::InMemoryPostStore;
#[cfg(feature = "db")]
pub use mongo::MongoPostStore;

use crate::error::Result;
use crate::report::TitlePattern;
use crate::types::Post;
use async_trait::async_trait;

/// Storage trait for the posts collection
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Remove every document; returns how many were deleted.
    async fn delete_all(&self) -> Result<u64>;

    /// Insert all posts as one batch; returns how many were inserted.
    async fn insert_many(&self, posts: &[Post]) -> Result<u64>;

    async fn count(&self) -> Result<u64>;

    /// ViewCount of every stored document.
    async fn view_counts(&self) -> Result<Vec<i64>>;

    /// Posts whose Title matches `pattern`, in store order.
    async fn find_by_title(&self, pattern: &TitlePattern) -> Result<Vec<Post>>;

    /// Release the underlying connection.
    async fn close(&self);
}
