use crate::database::models::{ContentKind, ContentRecord};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteContentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ContentRecord> {
    let kind_raw: String = row.get(1)?;
    let kind = ContentKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown content kind {kind_raw:?}").into(),
        )
    })?;
    Ok(ContentRecord {
        id: row.get(0)?,
        kind,
        author_id: row.get(2)?,
        published: row.get::<_, i64>(3)? != 0,
        likes_count: row.get(4)?,
        comments_count: row.get(5)?,
        views_count: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl<'conn> super::ContentRepository for SqliteContentRepository<'conn> {
    fn create(&self, record: &ContentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO contents (id, kind, author_id, published, likes_count, comments_count, views_count, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5)
            "#,
            params![
                record.id,
                record.kind.as_str(),
                record.author_id,
                record.published as i64,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ContentRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, kind, author_id, published, likes_count, comments_count, views_count, created_at
                FROM contents
                WHERE id = ?1
                "#,
                params![id],
                record_from_row,
            )
            .optional()?)
    }

    fn increment_views(&self, id: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                r#"
                UPDATE contents
                SET views_count = views_count + 1
                WHERE id = ?1 AND published = 1
                RETURNING views_count
                "#,
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn apply_likes_delta(&self, id: &str, delta: i64) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE contents SET likes_count = likes_count + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        if updated == 0 {
            anyhow::bail!("content {id} vanished while adjusting likes_count");
        }
        Ok(())
    }

    fn apply_comments_delta(&self, id: &str, delta: i64) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE contents SET comments_count = comments_count + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        if updated == 0 {
            anyhow::bail!("content {id} vanished while adjusting comments_count");
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM contents WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
