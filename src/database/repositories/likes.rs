use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteLikeRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::LikeRepository for SqliteLikeRepository<'conn> {
    fn exists(&self, user_id: &str, content_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM like_edges
            WHERE user_id = ?1 AND content_id = ?2
            "#,
            params![user_id, content_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert(&self, user_id: &str, content_id: &str, created_at: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO like_edges (user_id, content_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![user_id, content_id, created_at],
        )?;
        Ok(())
    }

    fn delete(&self, user_id: &str, content_id: &str) -> Result<bool> {
        let removed = self.conn.execute(
            r#"
            DELETE FROM like_edges
            WHERE user_id = ?1 AND content_id = ?2
            "#,
            params![user_id, content_id],
        )?;
        Ok(removed > 0)
    }

    fn count_for_content(&self, content_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM like_edges WHERE content_id = ?1",
            params![content_id],
            |row| row.get(0),
        )?)
    }
}
