use serde::{Deserialize, Serialize};

/// Tagged content kind: articles and videos share one engagement model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Video,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Video => "video",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "article" => Some(ContentKind::Article),
            "video" => Some(ContentKind::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Visible,
    Hidden,
}

impl CommentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentStatus::Visible => "visible",
            CommentStatus::Hidden => "hidden",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "visible" => Some(CommentStatus::Visible),
            "hidden" => Some(CommentStatus::Hidden),
            _ => None,
        }
    }
}

/// A content item with engine-owned denormalized counters. Counters are
/// derived from edge/comment rows and are never client-authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub kind: ContentKind,
    pub author_id: String,
    pub published: bool,
    pub likes_count: i64,
    pub comments_count: i64,
    pub views_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeEdgeRecord {
    pub user_id: String,
    pub content_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub content_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
    pub status: CommentStatus,
}
