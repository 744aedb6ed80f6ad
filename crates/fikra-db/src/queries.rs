use crate::models::{CommentRow, IdeaRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const IDEA_COLUMNS: &str = "i.id, i.title, i.description, i.category, i.image, i.votes, i.downvotes, i.submitter_id, u.username";

impl Database {
    // -- Users --

    /// Inserts a user with the default `submitter` role and returns its id,
    /// or `None` when the username is already taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)
                 ON CONFLICT(username) DO NOTHING",
                (username, password_hash),
            )?;
            Ok((inserted > 0).then(|| conn.last_insert_rowid()))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// Returns false when no such user exists.
    pub fn set_user_role(&self, username: &str, role: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET role = ?1 WHERE username = ?2",
                (role, username),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Ideas --

    pub fn insert_idea(
        &self,
        title: &str,
        description: &str,
        category: &str,
        image: Option<&str>,
        submitter_id: i64,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ideas (title, description, category, image, submitter_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![title, description, category, image, submitter_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All ideas, newest first.
    pub fn list_ideas(&self) -> Result<Vec<IdeaRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IDEA_COLUMNS} FROM ideas i
                 LEFT JOIN users u ON i.submitter_id = u.id
                 ORDER BY i.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], idea_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_idea(&self, id: i64) -> Result<Option<IdeaRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IDEA_COLUMNS} FROM ideas i
                 LEFT JOIN users u ON i.submitter_id = u.id
                 WHERE i.id = ?1"
            );
            let row = conn.query_row(&sql, [id], idea_from_row).optional()?;
            Ok(row)
        })
    }

    /// Bumps the upvote counter in place. Returns false if the idea is missing.
    pub fn increment_votes(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE ideas SET votes = votes + 1 WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Bumps the downvote counter in place. Returns false if the idea is missing.
    pub fn increment_downvotes(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("UPDATE ideas SET downvotes = downvotes + 1 WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Deletes an idea together with its comments in one transaction.
    /// Returns false if the idea did not exist.
    pub fn delete_idea(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM comments WHERE idea_id = ?1", [id])?;
            let removed = tx.execute("DELETE FROM ideas WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, idea_id: i64, user_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (content, idea_id, user_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![content, idea_id, user_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Comments of one idea in the order they were written.
    pub fn get_comments(&self, idea_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.content, c.idea_id, c.user_id, u.username
                 FROM comments c
                 LEFT JOIN users u ON c.user_id = u.id
                 WHERE c.idea_id = ?1
                 ORDER BY c.id ASC",
            )?;
            let rows = stmt
                .query_map([idea_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        idea_id: row.get(2)?,
                        user_id: row.get(3)?,
                        author_username: row
                            .get::<_, Option<String>>(4)?
                            .unwrap_or_else(|| "unknown".to_string()),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_comments(&self, idea_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE idea_id = ?1",
                [idea_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    filter: &str,
    value: P,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, role FROM users WHERE {filter}");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn idea_from_row(row: &Row<'_>) -> rusqlite::Result<IdeaRow> {
    Ok(IdeaRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        image: row.get(4)?,
        votes: row.get(5)?,
        downvotes: row.get(6)?,
        submitter_id: row.get(7)?,
        submitter_username: row
            .get::<_, Option<String>>(8)?
            .unwrap_or_else(|| "unknown".to_string()),
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
