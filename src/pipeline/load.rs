use crate::error::Result;
use crate::storage::PostStore;
use crate::types::Post;
use tracing::info;

/// Replaces the whole collection with `posts`: delete everything, then insert
/// the batch. Returns the inserted count.
///
/// There is no rollback. If the insert fails after the delete, the collection
/// is left empty or partially loaded.
pub async fn replace_collection(store: &dyn PostStore, posts: &[Post]) -> Result<u64> {
    info!("Deleting existing documents...");
    let deleted = store.delete_all().await?;
    info!("Deleted {} existing documents", deleted);

    info!("Inserting {} documents...", posts.len());
    let inserted = store.insert_many(posts).await?;
    info!("{} documents inserted", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize_record;
    use crate::storage::InMemoryPostStore;
    use crate::types::RawRecord;

    fn post(id: &str) -> Post {
        let raw: RawRecord = [("Id".to_string(), id.to_string())].into_iter().collect();
        normalize_record(&raw)
    }

    #[tokio::test]
    async fn test_existing_documents_are_replaced() {
        let store = InMemoryPostStore::with_posts(vec![post("old-1"), post("old-2"), post("old-3")]);
        let fresh = vec![post("new-1"), post("new-2")];

        let inserted = replace_collection(&store, &fresh).await.unwrap();

        assert_eq!(inserted, 2);
        let ids: Vec<String> = store.snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["new-1", "new-2"]);
    }

    #[tokio::test]
    async fn test_empty_batch_empties_the_collection() {
        let store = InMemoryPostStore::with_posts(vec![post("old")]);
        let inserted = replace_collection(&store, &[]).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
