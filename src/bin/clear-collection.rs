use posts_pipeline::config::Config;
use posts_pipeline::constants::{COLLECTION_NAME, DATABASE_NAME};
use posts_pipeline::storage::{MongoPostStore, PostStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::load(None)?;

    println!(
        "⚠️  WARNING: This will delete ALL documents from {}.{}!",
        DATABASE_NAME, COLLECTION_NAME
    );
    println!("Press Enter to continue or Ctrl+C to cancel...");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    println!("🗑️  Clearing collection...");
    let store = MongoPostStore::connect(&config.store.uri).await?;
    let result = store.delete_all().await;
    store.close().await;

    println!("✅ Deleted {} documents", result?);
    Ok(())
}
