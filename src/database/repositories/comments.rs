use crate::database::models::{CommentRecord, CommentStatus};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    let status_raw: String = row.get(6)?;
    let status = CommentStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("unknown comment status {status_raw:?}").into(),
        )
    })?;
    Ok(CommentRecord {
        id: row.get(0)?,
        content_id: row.get(1)?,
        parent_id: row.get(2)?,
        author_id: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        status,
    })
}

const COMMENT_COLUMNS: &str = "id, content_id, parent_id, author_id, body, created_at, status";

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, content_id, parent_id, author_id, body, created_at, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.content_id,
                record.parent_id,
                record.author_id,
                record.body,
                record.created_at,
                record.status.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id],
                record_from_row,
            )
            .optional()?)
    }

    fn list_visible_for_content(&self, content_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE content_id = ?1 AND status = 'visible'
            ORDER BY datetime(created_at) ASC, rowid ASC
            "#
        ))?;
        let rows = stmt.query_map(params![content_id], record_from_row)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn reply_ids(&self, comment_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id
            FROM comments
            WHERE parent_id = ?1
            ORDER BY datetime(created_at) ASC, rowid ASC
            "#,
        )?;
        let rows = stmt.query_map(params![comment_id], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn set_status(&self, id: &str, status: CommentStatus) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE comments SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(updated > 0)
    }

    fn delete_with_replies(&self, comment_id: &str) -> Result<(i64, i64)> {
        let (total, visible): (i64, i64) = self.conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'visible' THEN 1 ELSE 0 END), 0)
            FROM comments
            WHERE id = ?1 OR parent_id = ?1
            "#,
            params![comment_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        self.conn.execute(
            "DELETE FROM comments WHERE id = ?1 OR parent_id = ?1",
            params![comment_id],
        )?;
        Ok((total, visible))
    }

    fn count_visible_for_content(&self, content_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE content_id = ?1 AND status = 'visible'",
            params![content_id],
            |row| row.get(0),
        )?)
    }

    fn content_ids_for_author(&self, author_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT content_id FROM comments WHERE author_id = ?1")?;
        let rows = stmt.query_map(params![author_id], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
