use std::{collections::HashMap, sync::Mutex};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::auth::repo_types::{ConflictField, NewUser, UserRecord};

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("{}", .0.message())]
    Conflict(ConflictField),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Durable mapping from email to user record.
///
/// Implementations must enforce uniqueness of email, username and usn
/// atomically inside `insert`; `find_conflict` is only a fast pre-check.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, InsertError>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_conflict(
        &self,
        email: &str,
        username: &str,
        usn: &str,
    ) -> anyhow::Result<Option<ConflictField>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, InsertError> {
        let res = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, full_name, username, branch, usn, study_year, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING email, full_name, username, branch, usn, study_year, role, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(user.branch.map(|b| b.as_str()))
        .bind(&user.usn)
        .bind(user.study_year)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(record) => Ok(record),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                InsertError::Conflict(conflict_from_violation(db_err.constraint(), db_err.message())),
            ),
            Err(e) => Err(InsertError::Store(anyhow::Error::new(e).context("insert user"))),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT email, full_name, username, branch, usn, study_year, role, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_conflict(
        &self,
        email: &str,
        username: &str,
        usn: &str,
    ) -> anyhow::Result<Option<ConflictField>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            r#"
            SELECT email, username, usn
            FROM users
            WHERE email = $1 OR username = $2 OR usn = $3
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(usn)
        .fetch_all(&self.db)
        .await
        .context("check user uniqueness")?;

        Ok(first_conflict(
            rows.iter().map(|(e, n, u)| (e.as_str(), n.as_str(), u.as_str())),
            email,
            username,
            usn,
        ))
    }
}

/// Maps a unique-violation on `users` to the field that collided.
pub(crate) fn conflict_from_violation(constraint: Option<&str>, message: &str) -> ConflictField {
    let hint = constraint.unwrap_or(message);
    if hint.contains("pkey") || hint.contains("email") {
        ConflictField::Email
    } else if hint.contains("usn") {
        ConflictField::Usn
    } else if hint.contains("username") {
        ConflictField::Username
    } else {
        ConflictField::Unknown
    }
}

/// Email collisions win over usn, usn over username.
fn first_conflict<'a>(
    existing: impl Iterator<Item = (&'a str, &'a str, &'a str)>,
    email: &str,
    username: &str,
    usn: &str,
) -> Option<ConflictField> {
    let mut found: Option<ConflictField> = None;
    for (e, n, u) in existing {
        let field = if e == email {
            ConflictField::Email
        } else if u == usn {
            ConflictField::Usn
        } else if n == username {
            ConflictField::Username
        } else {
            continue;
        };
        found = Some(match found {
            Some(prev) if rank(prev) <= rank(field) => prev,
            _ => field,
        });
    }
    found
}

fn rank(field: ConflictField) -> u8 {
    match field {
        ConflictField::Email => 0,
        ConflictField::Usn => 1,
        ConflictField::Username => 2,
        ConflictField::Unknown => 3,
    }
}

/// Process-local store used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, InsertError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;

        if let Some(field) = first_conflict(
            users
                .values()
                .map(|r| (r.email.as_str(), r.username.as_str(), r.usn.as_str())),
            &user.email,
            &user.username,
            &user.usn,
        ) {
            return Err(InsertError::Conflict(field));
        }

        let record = UserRecord {
            email: user.email,
            full_name: user.full_name,
            username: user.username,
            branch: user.branch.map(|b| b.as_str().to_string()),
            usn: user.usn,
            study_year: user.study_year,
            role: user.role.as_str().to_string(),
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let users = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(users.get(email).cloned())
    }

    async fn find_conflict(
        &self,
        email: &str,
        username: &str,
        usn: &str,
    ) -> anyhow::Result<Option<ConflictField>> {
        let users = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(first_conflict(
            users
                .values()
                .map(|r| (r.email.as_str(), r.username.as_str(), r.usn.as_str())),
            email,
            username,
            usn,
        ))
    }
}
