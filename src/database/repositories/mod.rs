mod comments;
mod contents;
mod likes;

use super::models::{CommentRecord, CommentStatus, ContentRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait ContentRepository {
    fn create(&self, record: &ContentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ContentRecord>>;
    /// Atomic relative increment; returns the new count, or None when the
    /// id does not reference a published content item.
    fn increment_views(&self, id: &str) -> Result<Option<i64>>;
    fn apply_likes_delta(&self, id: &str, delta: i64) -> Result<()>;
    fn apply_comments_delta(&self, id: &str, delta: i64) -> Result<()>;
    /// Removes the content row; edges and comments cascade with it.
    fn delete(&self, id: &str) -> Result<bool>;
}

pub trait LikeRepository {
    fn exists(&self, user_id: &str, content_id: &str) -> Result<bool>;
    fn insert(&self, user_id: &str, content_id: &str, created_at: &str) -> Result<()>;
    fn delete(&self, user_id: &str, content_id: &str) -> Result<bool>;
    fn count_for_content(&self, content_id: &str) -> Result<i64>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<CommentRecord>>;
    /// Visible comments for a content item, oldest-first by store order.
    fn list_visible_for_content(&self, content_id: &str) -> Result<Vec<CommentRecord>>;
    fn reply_ids(&self, comment_id: &str) -> Result<Vec<String>>;
    fn set_status(&self, id: &str, status: CommentStatus) -> Result<bool>;
    /// Hard-removes the comment and its direct replies; returns
    /// (total rows removed, visible rows removed).
    fn delete_with_replies(&self, comment_id: &str) -> Result<(i64, i64)>;
    fn count_visible_for_content(&self, content_id: &str) -> Result<i64>;
    /// Distinct content ids carrying at least one comment by the author.
    fn content_ids_for_author(&self, author_id: &str) -> Result<Vec<String>>;
}

/// Thin wrapper handing out rusqlite-backed repository implementations
/// bound to one connection (or one open transaction).
pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn contents(&self) -> impl ContentRepository + '_ {
        contents::SqliteContentRepository { conn: self.conn }
    }

    pub fn likes(&self) -> impl LikeRepository + '_ {
        likes::SqliteLikeRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ContentKind;
    use crate::database::MIGRATIONS;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(MIGRATIONS).expect("migrations");
        conn
    }

    fn article(id: &str, published: bool) -> ContentRecord {
        ContentRecord {
            id: id.into(),
            kind: ContentKind::Article,
            author_id: "author-1".into(),
            published,
            likes_count: 0,
            comments_count: 0,
            views_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn content_round_trip_and_view_increment() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos.contents().create(&article("c1", true)).unwrap();
        let fetched = repos.contents().get("c1").unwrap().unwrap();
        assert_eq!(fetched.kind, ContentKind::Article);
        assert!(fetched.published);
        assert_eq!(fetched.views_count, 0);

        assert_eq!(repos.contents().increment_views("c1").unwrap(), Some(1));
        assert_eq!(repos.contents().increment_views("c1").unwrap(), Some(2));
        assert_eq!(repos.contents().increment_views("missing").unwrap(), None);
    }

    #[test]
    fn unpublished_content_rejects_views() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.contents().create(&article("draft", false)).unwrap();
        assert_eq!(repos.contents().increment_views("draft").unwrap(), None);
    }

    #[test]
    fn like_edge_uniqueness_is_store_enforced() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.contents().create(&article("c1", true)).unwrap();

        let likes = repos.likes();
        likes.insert("u1", "c1", "2024-01-01T00:00:00Z").unwrap();
        assert!(likes.exists("u1", "c1").unwrap());
        // Second insert for the same (user, content) violates the PK.
        assert!(likes.insert("u1", "c1", "2024-01-01T00:00:01Z").is_err());
        assert_eq!(likes.count_for_content("c1").unwrap(), 1);

        assert!(likes.delete("u1", "c1").unwrap());
        assert!(!likes.delete("u1", "c1").unwrap());
        assert_eq!(likes.count_for_content("c1").unwrap(), 0);
    }

    #[test]
    fn comment_cascade_delete_reports_visible_rows() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.contents().create(&article("c1", true)).unwrap();

        let comments = repos.comments();
        let top = CommentRecord {
            id: "m1".into(),
            content_id: "c1".into(),
            parent_id: None,
            author_id: "u1".into(),
            body: "top".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            status: CommentStatus::Visible,
        };
        comments.create(&top).unwrap();
        for (idx, status) in [
            (1, CommentStatus::Visible),
            (2, CommentStatus::Visible),
            (3, CommentStatus::Hidden),
        ] {
            comments
                .create(&CommentRecord {
                    id: format!("r{idx}"),
                    content_id: "c1".into(),
                    parent_id: Some("m1".into()),
                    author_id: "u2".into(),
                    body: format!("reply {idx}"),
                    created_at: format!("2024-01-01T00:00:0{idx}Z"),
                    status,
                })
                .unwrap();
        }

        assert_eq!(comments.reply_ids("m1").unwrap().len(), 3);
        let (total, visible) = comments.delete_with_replies("m1").unwrap();
        assert_eq!(total, 4);
        assert_eq!(visible, 3);
        assert!(comments.get("m1").unwrap().is_none());
        assert!(comments.get("r1").unwrap().is_none());
    }

    #[test]
    fn visible_listing_skips_hidden_rows() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.contents().create(&article("c1", true)).unwrap();

        let comments = repos.comments();
        for (id, status) in [("m1", CommentStatus::Visible), ("m2", CommentStatus::Hidden)] {
            comments
                .create(&CommentRecord {
                    id: id.into(),
                    content_id: "c1".into(),
                    parent_id: None,
                    author_id: "u1".into(),
                    body: id.into(),
                    created_at: "2024-01-01T00:00:00Z".into(),
                    status,
                })
                .unwrap();
        }

        let listed = comments.list_visible_for_content("c1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "m1");
        assert_eq!(comments.count_visible_for_content("c1").unwrap(), 1);

        assert!(comments.set_status("m1", CommentStatus::Hidden).unwrap());
        assert_eq!(comments.count_visible_for_content("c1").unwrap(), 0);
    }

    #[test]
    fn author_content_ids_are_distinct() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.contents().create(&article("c1", true)).unwrap();
        repos.contents().create(&article("c2", true)).unwrap();

        let comments = repos.comments();
        for (id, content) in [("m1", "c1"), ("m2", "c1"), ("m3", "c2")] {
            comments
                .create(&CommentRecord {
                    id: id.into(),
                    content_id: content.into(),
                    parent_id: None,
                    author_id: "u1".into(),
                    body: "x".into(),
                    created_at: "2024-01-01T00:00:00Z".into(),
                    status: CommentStatus::Visible,
                })
                .unwrap();
        }

        let mut ids = comments.content_ids_for_author("u1").unwrap();
        ids.sort();
        assert_eq!(ids, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn content_delete_cascades_edges_and_comments() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.contents().create(&article("c1", true)).unwrap();
        repos
            .likes()
            .insert("u1", "c1", "2024-01-01T00:00:00Z")
            .unwrap();
        repos
            .comments()
            .create(&CommentRecord {
                id: "m1".into(),
                content_id: "c1".into(),
                parent_id: None,
                author_id: "u1".into(),
                body: "x".into(),
                created_at: "2024-01-01T00:00:00Z".into(),
                status: CommentStatus::Visible,
            })
            .unwrap();

        assert!(repos.contents().delete("c1").unwrap());
        assert_eq!(repos.likes().count_for_content("c1").unwrap(), 0);
        assert!(repos
            .comments()
            .list_visible_for_content("c1")
            .unwrap()
            .is_empty());
    }
}
