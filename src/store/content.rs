use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::models::{Comment, Post, PostFilter, PostPatch, User};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;
use crate::store::{new_id, now_timestamp, require_text};

const POST_COLUMNS: &str =
    "id, title, body, author_id, username, image_url, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, post_id, author_id, username, body, created_at, updated_at";

/// Posts and their comments. Ownership is checked here, not in the routes.
#[derive(Clone)]
pub struct ContentStore {
    db: DbPool,
}

impl ContentStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // --- Posts ---

    pub fn create_post(
        &self,
        author_id: &str,
        title: &str,
        body: &str,
        image_url: Option<&str>,
    ) -> AppResult<Post> {
        let title = require_text(title, "Title")?;
        let body = require_text(body, "Body")?;
        let image_url = normalize_url(image_url);

        let conn = self.db.get()?;
        let author = load_author(&conn, author_id)?;

        let now = now_timestamp();
        let post = Post {
            id: new_id(),
            title,
            body,
            author_id: author.id,
            username: author.username,
            image_url,
            created_at: now.clone(),
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO posts (id, title, body, author_id, username, image_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                post.id,
                post.title,
                post.body,
                post.author_id,
                post.username,
                post.image_url,
                post.created_at,
                post.updated_at
            ],
        )?;

        tracing::info!("Post {} created by {}", post.id, post.author_id);
        Ok(post)
    }

    /// All posts matching the filter, newest first. No paging.
    /// The title search is a case-insensitive substring match over full Unicode.
    pub fn list_posts(&self, filter: &PostFilter) -> AppResult<Vec<Post>> {
        let mut sql = format!("SELECT {} FROM posts", POST_COLUMNS);
        let mut args: Vec<Value> = Vec::new();

        if let Some(author_id) = filter.author_id.as_deref().filter(|s| !s.is_empty()) {
            args.push(Value::Text(author_id.to_string()));
            sql.push_str(" WHERE author_id = ?1");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.db.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut posts = stmt
            .query_map(params_from_iter(args), post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        // SQLite LIKE folds ASCII only
        if let Some(needle) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
        {
            posts.retain(|p| p.title.to_lowercase().contains(&needle));
        }
        Ok(posts)
    }

    pub fn get_post(&self, id: &str) -> AppResult<Post> {
        let conn = self.db.get()?;
        find_post(&conn, id)?.ok_or_else(post_not_found)
    }

    pub fn update_post(&self, id: &str, author_id: &str, patch: PostPatch) -> AppResult<Post> {
        let conn = self.db.get()?;
        let mut post = find_post(&conn, id)?.ok_or_else(post_not_found)?;
        if post.author_id != author_id {
            return Err(AppError::Forbidden(
                "You can only update your own posts".into(),
            ));
        }

        if let Some(title) = patch.title {
            post.title = require_text(&title, "Title")?;
        }
        if let Some(body) = patch.body {
            post.body = require_text(&body, "Body")?;
        }
        if patch.image_url.is_some() {
            post.image_url = normalize_url(patch.image_url.as_deref());
        }
        post.updated_at = now_timestamp();

        conn.execute(
            "UPDATE posts SET title = ?1, body = ?2, image_url = ?3, updated_at = ?4 WHERE id = ?5",
            params![post.title, post.body, post.image_url, post.updated_at, post.id],
        )?;

        tracing::info!("Post {} updated", post.id);
        Ok(post)
    }

    pub fn delete_post(&self, id: &str, author_id: &str) -> AppResult<()> {
        let conn = self.db.get()?;
        let post = find_post(&conn, id)?.ok_or_else(post_not_found)?;
        if post.author_id != author_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".into(),
            ));
        }

        conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tracing::info!("Post {} deleted", id);
        Ok(())
    }

    // --- Comments ---

    pub fn create_comment(&self, post_id: &str, author_id: &str, body: &str) -> AppResult<Comment> {
        let body = require_text(body, "Comment")?;

        let conn = self.db.get()?;
        if find_post(&conn, post_id)?.is_none() {
            return Err(post_not_found());
        }
        let author = load_author(&conn, author_id)?;

        let now = now_timestamp();
        let comment = Comment {
            id: new_id(),
            post_id: post_id.to_string(),
            author_id: author.id,
            username: author.username,
            body,
            created_at: now.clone(),
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO comments (id, post_id, author_id, username, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                comment.id,
                comment.post_id,
                comment.author_id,
                comment.username,
                comment.body,
                comment.created_at,
                comment.updated_at
            ],
        )?;

        tracing::info!("Comment {} added to post {}", comment.id, comment.post_id);
        Ok(comment)
    }

    /// Comments on a post, oldest first. An unknown post simply has none.
    pub fn list_comments(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        let conn = self.db.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE post_id = ?1 ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(params![post_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn get_comment(&self, id: &str) -> AppResult<Comment> {
        let conn = self.db.get()?;
        find_comment(&conn, id)?.ok_or_else(comment_not_found)
    }

    pub fn update_comment(&self, id: &str, author_id: &str, body: &str) -> AppResult<Comment> {
        let conn = self.db.get()?;
        let mut comment = find_comment(&conn, id)?.ok_or_else(comment_not_found)?;
        if comment.author_id != author_id {
            return Err(AppError::Forbidden(
                "You can only update your own comments".into(),
            ));
        }

        comment.body = require_text(body, "Comment")?;
        comment.updated_at = now_timestamp();
        conn.execute(
            "UPDATE comments SET body = ?1, updated_at = ?2 WHERE id = ?3",
            params![comment.body, comment.updated_at, comment.id],
        )?;

        tracing::info!("Comment {} updated", comment.id);
        Ok(comment)
    }

    pub fn delete_comment(&self, id: &str, author_id: &str) -> AppResult<()> {
        let conn = self.db.get()?;
        let comment = find_comment(&conn, id)?.ok_or_else(comment_not_found)?;
        if comment.author_id != author_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".into(),
            ));
        }

        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        tracing::info!("Comment {} deleted", id);
        Ok(())
    }
}

// --- Query helpers ---

fn load_author(conn: &Connection, author_id: &str) -> AppResult<User> {
    conn.query_row(
        "SELECT id, username, email, created_at, updated_at FROM users WHERE id = ?1",
        params![author_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("User not found".into()))
}

fn find_post(conn: &Connection, id: &str) -> AppResult<Option<Post>> {
    let post = conn
        .query_row(
            &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
            params![id],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

fn find_comment(conn: &Connection, id: &str) -> AppResult<Option<Comment>> {
    let comment = conn
        .query_row(
            &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
            params![id],
            comment_from_row,
        )
        .optional()?;
    Ok(comment)
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author_id: row.get(3)?,
        username: row.get(4)?,
        image_url: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        username: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".into())
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".into())
}

/// Blank image URLs clear the field.
fn normalize_url(url: Option<&str>) -> Option<String> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}
