use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use crate::db::models::{User, UserRecord};
use crate::error::{AppError, AppResult, AuthError};
use crate::state::DbPool;
use crate::store::{new_id, now_timestamp, require_text};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

/// User accounts and their bcrypt password hashes.
#[derive(Clone)]
pub struct CredentialStore {
    db: DbPool,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(db: DbPool, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Create an account. Username and email must both be unused.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        let username = require_text(username, "Username")?;
        let email = require_text(email, "Email")?;
        if !email.contains('@') {
            return Err(AppError::Validation("Email address is invalid".into()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let now = now_timestamp();
        let user = User {
            id: new_id(),
            username,
            email,
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.db.get()?;
        let inserted = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.username,
                user.email,
                password_hash,
                user.created_at,
                user.updated_at
            ],
        );

        match inserted {
            Ok(_) => {
                tracing::info!("Registered user {} ({})", user.username, user.id);
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(AppError::Validation(
                    "Username or email is already taken".into(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let conn = self.db.get()?;
        let record = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email.trim()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let conn = self.db.get()?;
        let record = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record.map(|r| r.user))
    }

    /// Check a login attempt. Unknown email is `NotFound`, a bad password is `WrongCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let record = self
            .find_by_email(email)?
            .ok_or_else(|| AppError::NotFound("User not found!".into()))?;

        let password = password.to_string();
        let hash = record.password_hash;
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;

        if !matches {
            tracing::warn!("Failed login for user {}", record.user.id);
            return Err(AuthError::WrongCredentials.into());
        }
        Ok(record.user)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user: User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        },
        password_hash: row.get(3)?,
    })
}
