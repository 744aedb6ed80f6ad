//! Database row types. These map directly to SQLite rows and are kept apart
//! from the fikra-types models so the page layer never sees password hashes.

use fikra_types::models::{Comment, Idea};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
}

pub struct IdeaRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: Option<String>,
    pub votes: i64,
    pub downvotes: i64,
    pub submitter_id: i64,
    pub submitter_username: String,
}

pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub idea_id: i64,
    pub user_id: i64,
    pub author_username: String,
}

impl From<IdeaRow> for Idea {
    fn from(row: IdeaRow) -> Self {
        Idea {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            image: row.image,
            votes: row.votes,
            downvotes: row.downvotes,
            submitter_id: row.submitter_id,
            submitter_username: row.submitter_username,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            content: row.content,
            idea_id: row.idea_id,
            user_id: row.user_id,
            author_username: row.author_username,
        }
    }
}
