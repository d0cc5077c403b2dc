//! Cursor slicing for comment listings.

use std::collections::BTreeMap;

use domains::{CommentsQuery, PostComment, SortOrder};

use crate::limits::PostLimits;

/// Slices `comments` (any order) according to `query`.
///
/// - `max_id` keeps the `count_max` comments closest below it (`id < max_id`);
/// - `min_id` keeps the `count_min` comments closest at or above it (`id >= min_id`);
/// - both together yield the union, so `min_id == max_id` selects the
///   comments immediately around that id;
/// - neither yields the newest `count_max` comments.
///
/// Counts default to `comments_default_count` and are capped at
/// `comments_max_count`. The result is ordered by `query.sort`.
pub fn slice_comments(comments: Vec<PostComment>, query: &CommentsQuery, limits: &PostLimits) -> Vec<PostComment> {
    let cap = |count: Option<usize>| {
        count
            .unwrap_or(limits.comments_default_count)
            .min(limits.comments_max_count)
    };
    let count_max = cap(query.count_max);
    let count_min = cap(query.count_min);

    let by_id: BTreeMap<_, _> = comments.into_iter().map(|c| (c.id, c)).collect();
    let mut selected = BTreeMap::new();

    match (query.max_id, query.min_id) {
        (None, None) => {
            selected.extend(by_id.into_iter().rev().take(count_max));
        }
        (max_id, min_id) => {
            if let Some(max_id) = max_id {
                selected.extend(
                    by_id
                        .range(..max_id)
                        .rev()
                        .take(count_max)
                        .map(|(id, c)| (*id, c.clone())),
                );
            }
            if let Some(min_id) = min_id {
                selected.extend(
                    by_id
                        .range(min_id..)
                        .take(count_min)
                        .map(|(id, c)| (*id, c.clone())),
                );
            }
        }
    }

    let ascending = selected.into_values();
    match query.sort {
        SortOrder::Ascending => ascending.collect(),
        SortOrder::Descending => ascending.rev().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{CommentId, PostId, UserId};

    fn comments(n: u64) -> Vec<PostComment> {
        (1..=n)
            .map(|i| PostComment {
                id: CommentId(i * 10),
                post: PostId(1),
                commenter: UserId(1),
                text: format!("comment {i}"),
                is_edited: false,
                created_at: Utc::now(),
            })
            .collect()
    }

    fn ids(slice: &[PostComment]) -> Vec<u64> {
        slice.iter().map(|c| c.id.0).collect()
    }

    #[test]
    fn test_default_returns_newest_first() {
        let limits = PostLimits::default();
        let slice = slice_comments(comments(15), &CommentsQuery::default(), &limits);
        assert_eq!(slice.len(), limits.comments_default_count);
        assert_eq!(ids(&slice)[0], 150);
        assert!(ids(&slice).windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_max_id_is_strictly_less_than() {
        let query = CommentsQuery { max_id: Some(CommentId(60)), ..Default::default() };
        let slice = slice_comments(comments(10), &query, &PostLimits::default());
        assert_eq!(ids(&slice), vec![50, 40, 30, 20, 10]);
    }

    #[test]
    fn test_min_id_is_greater_or_equal() {
        let query = CommentsQuery { min_id: Some(CommentId(80)), ..Default::default() };
        let slice = slice_comments(comments(10), &query, &PostLimits::default());
        assert_eq!(ids(&slice), vec![100, 90, 80]);
    }

    #[test]
    fn test_equal_cursors_select_around_the_id() {
        let query = CommentsQuery {
            max_id: Some(CommentId(100)),
            min_id: Some(CommentId(100)),
            count_max: Some(2),
            count_min: Some(3),
            sort: SortOrder::Ascending,
        };
        let slice = slice_comments(comments(20), &query, &PostLimits::default());
        assert_eq!(ids(&slice), vec![80, 90, 100, 110, 120]);
    }

    #[test]
    fn test_counts_are_capped() {
        let query = CommentsQuery { count_max: Some(500), ..Default::default() };
        let limits = PostLimits::default();
        let slice = slice_comments(comments(40), &query, &limits);
        assert_eq!(slice.len(), limits.comments_max_count);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut shuffled = comments(5);
        shuffled.reverse();
        let query = CommentsQuery { sort: SortOrder::Ascending, ..Default::default() };
        let slice = slice_comments(shuffled, &query, &PostLimits::default());
        assert_eq!(ids(&slice), vec![10, 20, 30, 40, 50]);
    }
}
