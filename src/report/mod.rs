//! Reporting pipeline: two read-only queries over the posts collection, each
//! rendered to its own PDF.

pub mod pdf;
pub mod queries;

pub use pdf::render_report;
pub use queries::{mean_view_count, posts_matching_title, view_count_stats, TitlePattern};

use crate::constants::{
    TITLE_SEARCH_REPORT_FILE, TITLE_SEARCH_REPORT_TITLE, VIEW_COUNT_REPORT_FILE,
    VIEW_COUNT_REPORT_TITLE,
};
use crate::error::Result;
use crate::storage::PostStore;
use crate::types::ViewCountStats;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// Outcome of one reporting run. The two reports succeed or fail independently.
#[derive(Debug)]
pub struct ReportRun {
    pub view_counts: Result<ViewCountStats>,
    pub title_matches: Result<Vec<String>>,
}

impl ReportRun {
    pub fn is_success(&self) -> bool {
        self.view_counts.is_ok() && self.title_matches.is_ok()
    }
}

/// Lines of the mean ViewCount report.
pub fn view_count_lines(stats: &ViewCountStats) -> Vec<String> {
    vec![
        format!("Mean ViewCount: {:.2}", stats.mean_view_count),
        format!("Posts with ViewCount above the mean: {}", stats.above_mean),
    ]
}

/// Computes the mean ViewCount and writes the report into `out_dir`.
#[instrument(skip(store))]
pub async fn view_count_report(store: &dyn PostStore, out_dir: &Path) -> Result<ViewCountStats> {
    let stats = mean_view_count(store).await?;
    render_report(
        VIEW_COUNT_REPORT_TITLE,
        &view_count_lines(&stats),
        &out_dir.join(VIEW_COUNT_REPORT_FILE),
    )?;

    info!("Posts with ViewCount above the mean: {}", stats.above_mean);
    println!("Posts with ViewCount above the mean: {}", stats.above_mean);
    Ok(stats)
}

/// Finds posts whose title matches `pattern` and writes their titles into
/// `out_dir`. Returns the matched titles in store order.
#[instrument(skip(store, pattern))]
pub async fn title_search_report(
    store: &dyn PostStore,
    pattern: &TitlePattern,
    out_dir: &Path,
) -> Result<Vec<String>> {
    let posts = posts_matching_title(store, pattern).await?;
    let titles: Vec<String> = posts.into_iter().map(|p| p.title).collect();
    render_report(
        TITLE_SEARCH_REPORT_TITLE,
        &titles,
        &out_dir.join(TITLE_SEARCH_REPORT_FILE),
    )?;

    println!("Posts with a matching title: {}", titles.len());
    for title in &titles {
        println!("Title: {title}");
    }
    Ok(titles)
}

/// Runs both reports concurrently against the same store and waits for both.
pub async fn run_reports(
    store: &dyn PostStore,
    pattern: &TitlePattern,
    out_dir: &Path,
) -> Result<ReportRun> {
    fs::create_dir_all(out_dir)?;

    let (view_counts, title_matches) = tokio::join!(
        view_count_report(store, out_dir),
        title_search_report(store, pattern, out_dir),
    );

    Ok(ReportRun {
        view_counts,
        title_matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_count_lines_use_two_decimals() {
        let stats = view_count_stats(&[1, 2]);
        assert_eq!(
            view_count_lines(&stats),
            vec![
                "Mean ViewCount: 1.50".to_string(),
                "Posts with ViewCount above the mean: 1".to_string(),
            ]
        );
    }
}
