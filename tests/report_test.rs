use anyhow::Result;
use posts_pipeline::constants::{
    TITLE_FRAGMENTS, TITLE_SEARCH_REPORT_FILE, VIEW_COUNT_REPORT_FILE,
};
use posts_pipeline::pipeline::normalize_record;
use posts_pipeline::report::{render_report, run_reports, TitlePattern};
use posts_pipeline::storage::InMemoryPostStore;
use posts_pipeline::types::{Post, RawRecord};
use std::fs;
use tempfile::tempdir;

fn post(id: &str, title: &str, views: i64) -> Post {
    let raw: RawRecord = [
        ("Id".to_string(), id.to_string()),
        ("Title".to_string(), title.to_string()),
        ("ViewCount".to_string(), views.to_string()),
    ]
    .into_iter()
    .collect();
    normalize_record(&raw)
}

fn sample_store() -> InMemoryPostStore {
    InMemoryPostStore::with_posts(vec![
        post("1", "A wig store", 10),
        post("2", "No match here", 20),
        post("3", "ZAP!", 30),
        post("4", "Nothing to see", 40),
    ])
}

#[tokio::test]
async fn test_reports_compute_stats_and_matches() -> Result<()> {
    let out = tempdir()?;
    let store = sample_store();
    let pattern = TitlePattern::new(TITLE_FRAGMENTS)?;

    let run = run_reports(&store, &pattern, out.path()).await?;
    assert!(run.is_success());

    let stats = run.view_counts.as_ref().unwrap();
    assert_eq!(stats.total_posts, 4);
    assert_eq!(stats.mean_view_count, 25.0);
    assert_eq!(stats.above_mean, 2);

    let titles = run.title_matches.as_ref().unwrap();
    assert_eq!(titles, &vec!["A wig store".to_string(), "ZAP!".to_string()]);

    for file in [VIEW_COUNT_REPORT_FILE, TITLE_SEARCH_REPORT_FILE] {
        let pdf = lopdf::Document::load(out.path().join(file))?;
        assert_eq!(pdf.get_pages().len(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_reports_on_empty_collection_do_not_fail() -> Result<()> {
    let out = tempdir()?;
    let report_dir = out.path().join("nested").join("out");
    let store = InMemoryPostStore::new();
    let pattern = TitlePattern::new(["wig"])?;

    let run = run_reports(&store, &pattern, &report_dir).await?;
    assert!(run.is_success());

    let stats = run.view_counts.unwrap();
    assert_eq!(stats.mean_view_count, 0.0);
    assert_eq!(stats.above_mean, 0);
    assert!(run.title_matches.unwrap().is_empty());
    assert!(report_dir.join(VIEW_COUNT_REPORT_FILE).exists());
    assert!(report_dir.join(TITLE_SEARCH_REPORT_FILE).exists());
    Ok(())
}

#[test]
fn test_rendered_report_contains_title_and_numbered_lines() -> Result<()> {
    let out = tempdir()?;
    let path = out.path().join("report.pdf");
    let lines = vec!["Mean ViewCount: 25.00".to_string(), "Second line".to_string()];

    let pages = render_report("ViewCount Mean Report", &lines, &path)?;
    assert_eq!(pages, 1);

    let pdf = lopdf::Document::load(&path)?;
    let text = pdf.extract_text(&[1])?;
    assert!(text.contains("ViewCount Mean Report"));
    assert!(text.contains("1. Mean ViewCount: 25.00"));
    assert!(text.contains("2. Second line"));
    Ok(())
}

#[test]
fn test_rendering_overwrites_and_paginates() -> Result<()> {
    let out = tempdir()?;
    let path = out.path().join("report.pdf");
    fs::write(&path, b"stale contents")?;

    let lines: Vec<String> = (1..=150).map(|i| format!("Matched title number {i}")).collect();
    let pages = render_report("Matching Question Titles", &lines, &path)?;
    assert!(pages > 1);

    let pdf = lopdf::Document::load(&path)?;
    assert_eq!(pdf.get_pages().len(), pages);
    Ok(())
}

#[test]
fn test_render_into_missing_directory_is_an_error() {
    let out = tempdir().unwrap();
    let path = out.path().join("does-not-exist").join("report.pdf");
    let err = render_report("Title", &[], &path).unwrap_err();
    assert!(matches!(err, posts_pipeline::error::PostsError::Render { .. }));
}
