use crate::model::{
    Id,
    status::{Comment, Status, StatusMarker},
};
use std::collections::HashSet;

pub const EXCERPT_MAX_CHARS: usize = 160;
const EXCERPT_CUT_CHARS: usize = 157;
const EMPTY_EXCERPT: &str = "This update is driving the conversation.";

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct BoardInsights {
    pub posts: usize,
    pub likes: usize,
    pub comments: usize,
    pub contributors: usize,
    pub highlight: Option<Highlight>,
}

/// The most engaging post on the board.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Highlight {
    pub status_id: Id<StatusMarker>,
    pub author: String,
    pub metrics: String,
    pub excerpt: String,
}

impl BoardInsights {
    #[must_use]
    pub fn summarize(posts: &[Status]) -> Self {
        let mut insights = Self {
            posts: posts.len(),
            ..Self::default()
        };
        let mut contributors = HashSet::new();
        let mut top: Option<(&Status, usize)> = None;

        for post in posts {
            let likes = post.resolved_like_count();
            let comments = post.comment.len();

            insights.likes = insights.likes.saturating_add(likes);
            insights.comments = insights.comments.saturating_add(comments);

            contributors.insert(post.author_name());
            contributors.extend(post.comment.iter().map(Comment::author_name));

            let score = likes.saturating_mul(2).saturating_add(comments);
            if top.is_none_or(|(_, top_score)| score > top_score) {
                top = Some((post, score));
            }
        }

        insights.contributors = contributors.len();
        insights.highlight = top.map(|(post, _)| Highlight::of(post));
        insights
    }
}

impl Highlight {
    fn of(post: &Status) -> Self {
        Self {
            status_id: post.id.clone(),
            author: post.author_name(),
            metrics: format!(
                "{} likes • {} comments",
                post.resolved_like_count(),
                post.comment.len()
            ),
            excerpt: excerpt(&post.content),
        }
    }
}

fn excerpt(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        EMPTY_EXCERPT.to_owned()
    } else if trimmed.chars().count() > EXCERPT_MAX_CHARS {
        let cut: String = trimmed.chars().take(EXCERPT_CUT_CHARS).collect();
        format!("{cut}…")
    } else {
        trimmed.to_owned()
    }
}
