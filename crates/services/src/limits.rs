use serde::Deserialize;

/// Content length and listing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostLimits {
    pub post_max_length: usize,
    pub comment_max_length: usize,
    /// Page size when a listing request names no count.
    pub comments_default_count: usize,
    /// Upper bound for `count_max` / `count_min`.
    pub comments_max_count: usize,
}

impl Default for PostLimits {
    fn default() -> Self {
        Self {
            post_max_length: 5000,
            comment_max_length: 1500,
            comments_default_count: 10,
            comments_max_count: 20,
        }
    }
}
