use crate::error::{PostsError, Result};
use crate::storage::PostStore;
use crate::types::{Post, ViewCountStats};
use regex::{Regex, RegexBuilder};
use tracing::{info, warn};

/// Case-insensitive "title contains any of these fragments" predicate.
///
/// Matching is plain substring search: `wig` matches inside `wiggle`.
#[derive(Debug, Clone)]
pub struct TitlePattern {
    source: String,
    regex: Regex,
}

impl TitlePattern {
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let escaped: Vec<String> = fragments
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .map(|f| regex::escape(&f))
            .collect();
        if escaped.is_empty() {
            return Err(PostsError::Config(
                "title search needs at least one non-empty fragment".to_string(),
            ));
        }

        let source = escaped.join("|");
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| PostsError::Config(format!("invalid title pattern: {e}")))?;
        Ok(Self { source, regex })
    }

    /// The alternation without flags, suitable for a store-side `$regex`.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, title: &str) -> bool {
        self.regex.is_match(title)
    }
}

/// Mean ViewCount and the number of posts strictly above it.
///
/// An empty input yields a mean of 0 and a count of 0.
pub fn view_count_stats(view_counts: &[i64]) -> ViewCountStats {
    if view_counts.is_empty() {
        return ViewCountStats {
            total_posts: 0,
            mean_view_count: 0.0,
            above_mean: 0,
        };
    }

    let total: f64 = view_counts.iter().map(|&v| v as f64).sum();
    let mean = total / view_counts.len() as f64;
    let above_mean = view_counts.iter().filter(|&&v| v as f64 > mean).count();

    ViewCountStats {
        total_posts: view_counts.len(),
        mean_view_count: mean,
        above_mean,
    }
}

/// Reads every ViewCount from the store and summarises it.
pub async fn mean_view_count(store: &dyn PostStore) -> Result<ViewCountStats> {
    let view_counts = store.view_counts().await?;
    if view_counts.is_empty() {
        warn!("The posts collection is empty; reporting a mean ViewCount of 0");
    }
    let stats = view_count_stats(&view_counts);
    info!(
        "Mean ViewCount over {} posts: {:.2}",
        stats.total_posts, stats.mean_view_count
    );
    Ok(stats)
}

/// Every stored post whose title matches `pattern`, in store order.
pub async fn posts_matching_title(
    store: &dyn PostStore,
    pattern: &TitlePattern,
) -> Result<Vec<Post>> {
    let posts = store.find_by_title(pattern).await?;
    info!("{} posts have a title matching /{}/i", posts.len(), pattern.as_str());
    Ok(posts)
}
