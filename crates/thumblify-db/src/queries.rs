use crate::models::{NewThumbnail, ThumbnailRow, UserRow};
use crate::{Database, format_ts};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Row};

const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at";

const THUMBNAIL_COLUMNS: &str = "id, user_id, title, style, aspect_ratio, color_scheme, text_overlay, \
     user_prompt, prompt_used, image_url, asset_key, is_generating, created_at, updated_at";

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` when the email is already registered.
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let ts = format_ts(now);
        self.with_conn_mut(|conn| {
            let res = conn.execute(
                "INSERT INTO users (id, name, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, name, email, password_hash, ts],
            );
            match res {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Sessions --

    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![token_hash, user_id, format_ts(now), format_ts(expires_at)],
            )?;
            Ok(())
        })
    }

    /// Resolve a session to its user id, ignoring sessions past expiry.
    pub fn get_session_user(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
                rusqlite::params![token_hash, format_ts(now)],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])?;
            Ok(n > 0)
        })
    }

    pub fn prune_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                [format_ts(now)],
            )?;
            Ok(n)
        })
    }

    // -- Thumbnails --

    pub fn insert_thumbnail(&self, new: &NewThumbnail<'_>, now: DateTime<Utc>) -> Result<()> {
        let ts = format_ts(now);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO thumbnails (id, user_id, title, style, aspect_ratio, color_scheme,
                     text_overlay, user_prompt, prompt_used, is_generating, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
                rusqlite::params![
                    new.id,
                    new.user_id,
                    new.title,
                    new.style,
                    new.aspect_ratio,
                    new.color_scheme,
                    new.text_overlay,
                    new.user_prompt,
                    new.prompt_used,
                    ts,
                ],
            )?;
            Ok(())
        })
    }

    /// Attach the stored image to a record that is still generating.
    /// Returns the updated row, or `None` if the record vanished meanwhile.
    pub fn complete_thumbnail(
        &self,
        id: &str,
        image_url: &str,
        asset_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ThumbnailRow>> {
        let ts = format_ts(now);
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE thumbnails
                 SET image_url = ?2, asset_key = ?3, is_generating = 0, updated_at = ?4
                 WHERE id = ?1 AND is_generating = 1",
                rusqlite::params![id, image_url, asset_key, ts],
            )?;
            if n == 0 {
                return Ok(None);
            }
            query_thumbnail(conn, id)
        })
    }

    /// Unscoped delete, used when reconciling a failed generation.
    pub fn delete_thumbnail(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM thumbnails WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Owner-scoped delete. Returns the removed row so its asset can be cleaned up.
    pub fn delete_thumbnail_for_user(&self, id: &str, user_id: &str) -> Result<Option<ThumbnailRow>> {
        self.with_conn_mut(|conn| {
            let Some(row) = query_owned_thumbnail(conn, id, user_id)? else {
                return Ok(None);
            };
            conn.execute(
                "DELETE FROM thumbnails WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(Some(row))
        })
    }

    pub fn get_thumbnail_for_user(&self, id: &str, user_id: &str) -> Result<Option<ThumbnailRow>> {
        self.with_conn(|conn| query_owned_thumbnail(conn, id, user_id))
    }

    /// All thumbnails of a user, newest first.
    pub fn list_thumbnails_for_user(&self, user_id: &str) -> Result<Vec<ThumbnailRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {THUMBNAIL_COLUMNS} FROM thumbnails
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_thumbnail)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete records stuck in generation since before `cutoff`.
    /// Returns the ids that were removed.
    pub fn delete_stale_generating(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        self.with_conn_mut(|conn| {
            let mut stmt = conn.prepare(
                "DELETE FROM thumbnails
                 WHERE is_generating = 1 AND created_at < ?1
                 RETURNING id",
            )?;
            let ids = stmt
                .query_map([format_ts(cutoff)], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    })
    .optional()
}

fn query_thumbnail(conn: &Connection, id: &str) -> Result<Option<ThumbnailRow>> {
    let sql = format!("SELECT {THUMBNAIL_COLUMNS} FROM thumbnails WHERE id = ?1");
    conn.query_row(&sql, [id], map_thumbnail).optional()
}

fn query_owned_thumbnail(conn: &Connection, id: &str, user_id: &str) -> Result<Option<ThumbnailRow>> {
    let sql = format!("SELECT {THUMBNAIL_COLUMNS} FROM thumbnails WHERE id = ?1 AND user_id = ?2");
    conn.query_row(&sql, [id, user_id], map_thumbnail).optional()
}

fn map_thumbnail(row: &Row<'_>) -> rusqlite::Result<ThumbnailRow> {
    Ok(ThumbnailRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        style: row.get(3)?,
        aspect_ratio: row.get(4)?,
        color_scheme: row.get(5)?,
        text_overlay: row.get(6)?,
        user_prompt: row.get(7)?,
        prompt_used: row.get(8)?,
        image_url: row.get(9)?,
        asset_key: row.get(10)?,
        is_generating: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
