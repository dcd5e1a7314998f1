use super::PostStore;
use crate::constants::{COLLECTION_NAME, DATABASE_NAME};
use crate::error::{PostsError, Result};
use crate::report::TitlePattern;
use crate::types::Post;
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Wire shape of a post in MongoDB: timestamps as BSON dates.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PostDocument {
    id: String,
    post_type_id: Option<String>,
    accepted_answer_id: Option<String>,
    creation_date: Option<bson::DateTime>,
    score: i64,
    view_count: i64,
    body: String,
    owner_user_id: Option<String>,
    last_activity_date: Option<bson::DateTime>,
    title: String,
    tags: String,
    answer_count: i64,
    comment_count: i64,
    content_license: String,
}

impl From<&Post> for PostDocument {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            post_type_id: post.post_type_id.clone(),
            accepted_answer_id: post.accepted_answer_id.clone(),
            creation_date: post.creation_date.map(bson::DateTime::from_chrono),
            score: post.score,
            view_count: post.view_count,
            body: post.body.clone(),
            owner_user_id: post.owner_user_id.clone(),
            last_activity_date: post.last_activity_date.map(bson::DateTime::from_chrono),
            title: post.title.clone(),
            tags: post.tags.clone(),
            answer_count: post.answer_count,
            comment_count: post.comment_count,
            content_license: post.content_license.clone(),
        }
    }
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Self {
        Self {
            id: doc.id,
            post_type_id: doc.post_type_id,
            accepted_answer_id: doc.accepted_answer_id,
            creation_date: doc.creation_date.map(|d| d.to_chrono()),
            score: doc.score,
            view_count: doc.view_count,
            body: doc.body,
            owner_user_id: doc.owner_user_id,
            last_activity_date: doc.last_activity_date.map(|d| d.to_chrono()),
            title: doc.title,
            tags: doc.tags,
            answer_count: doc.answer_count,
            comment_count: doc.comment_count,
            content_license: doc.content_license,
        }
    }
}

/// Reads ViewCount whatever numeric type it was stored with; missing is 0.
fn view_count_of(document: &Document) -> i64 {
    match document.get("ViewCount") {
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Double(n)) if n.is_finite() => *n as i64,
        Some(other) => {
            warn!("Ignoring non-numeric ViewCount {:?}", other);
            0
        }
        None => 0,
    }
}

/// `posts_db.posts` on a MongoDB deployment.
pub struct MongoPostStore {
    client: Client,
    collection: Collection<PostDocument>,
}

impl MongoPostStore {
    /// Connect and verify the deployment answers a `ping`.
    pub async fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| PostsError::StoreConnection(e.to_string()))?;

        let database = client.database(DATABASE_NAME);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PostsError::StoreConnection(e.to_string()))?;
        info!("Connected to MongoDB");

        let collection = database.collection::<PostDocument>(COLLECTION_NAME);
        Ok(Self { client, collection })
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn delete_all(&self) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(|e| PostsError::store_op("delete_many", e))?;
        debug!("Deleted {} documents", result.deleted_count);
        Ok(result.deleted_count)
    }

    async fn insert_many(&self, posts: &[Post]) -> Result<u64> {
        // insert_many rejects an empty batch
        if posts.is_empty() {
            return Ok(0);
        }
        let documents: Vec<PostDocument> = posts.iter().map(PostDocument::from).collect();
        let result = self
            .collection
            .insert_many(documents)
            .await
            .map_err(|e| PostsError::store_op("insert_many", e))?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn count(&self) -> Result<u64> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|e| PostsError::store_op("count_documents", e))
    }

    async fn view_counts(&self) -> Result<Vec<i64>> {
        let documents: Vec<Document> = self
            .collection
            .clone_with_type::<Document>()
            .find(doc! {})
            .projection(doc! { "ViewCount": 1, "_id": 0 })
            .await
            .map_err(|e| PostsError::store_op("find", e))?
            .try_collect()
            .await
            .map_err(|e| PostsError::store_op("find", e))?;
        Ok(documents.iter().map(view_count_of).collect())
    }

    async fn find_by_title(&self, pattern: &TitlePattern) -> Result<Vec<Post>> {
        let filter = doc! {
            "Title": { "$regex": pattern.as_str(), "$options": "i" }
        };
        let documents: Vec<PostDocument> = self
            .collection
            .find(filter)
            .await
            .map_err(|e| PostsError::store_op("find", e))?
            .try_collect()
            .await
            .map_err(|e| PostsError::store_op("find", e))?;
        Ok(documents.into_iter().map(Post::from).collect())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB connection closed");
    }
}
