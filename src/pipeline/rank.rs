use crate::types::Post;

/// Orders posts by ViewCount, highest first, and keeps at most `limit`.
///
/// The sort is stable: posts with the same ViewCount keep their input order.
pub fn top_by_view_count(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
    posts.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    posts.truncate(limit);
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize_record;
    use crate::types::RawRecord;

    fn post(id: &str, views: i64) -> Post {
        let mut raw = RawRecord::new();
        raw.insert("Id".to_string(), id.to_string());
        let mut post = normalize_record(&raw);
        post.view_count = views;
        post
    }

    #[test]
    fn test_sorted_descending_and_truncated() {
        let posts: Vec<Post> = (0..25).map(|i| post(&i.to_string(), (i * 7) % 11)).collect();
        let ranked = top_by_view_count(posts, 10);

        assert_eq!(ranked.len(), 10);
        assert!(ranked.windows(2).all(|w| w[0].view_count >= w[1].view_count));
        assert_eq!(ranked[0].view_count, 10);
    }

    #[test]
    fn test_fewer_posts_than_limit_keeps_all() {
        let ranked = top_by_view_count(vec![post("a", 1), post("b", 5)], 10_000);
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_equal_view_counts_keep_input_order() {
        let posts = vec![
            post("first", 3),
            post("top", 9),
            post("second", 3),
            post("third", 3),
        ];
        let ranked = top_by_view_count(posts, 3);
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(top_by_view_count(Vec::new(), 10).is_empty());
    }
}
