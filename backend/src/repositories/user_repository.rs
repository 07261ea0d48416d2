//! Persistence for the [`User`] aggregate and its read-side queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::database::models::UserType;
use crate::domain::user::{User, UserResponse};
use crate::errors::ServiceResult;
use crate::repositories::{decode_authorities, encode_authorities};
use crate::uow::Repository;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    login_id: String,
    password: Option<String>,
    token: Option<String>,
    name: String,
    use_flag: bool,
    authorities: String,
    change_password_at: Option<DateTime<Utc>>,
    latest_active_at: Option<DateTime<Utc>>,
    joined_at: Option<DateTime<Utc>>,
    removed_flag: bool,
    removed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    created_by_id: i64,
    created_by_type: UserType,
    updated_at: DateTime<Utc>,
    updated_by_id: i64,
    updated_by_type: UserType,
}

impl UserRow {
    fn into_aggregate(self) -> ServiceResult<User> {
        let authorities = decode_authorities(&self.authorities)?;
        Ok(User::from_parts(
            self.id,
            self.login_id,
            self.password,
            self.token,
            self.name,
            self.use_flag,
            authorities,
            self.change_password_at,
            self.latest_active_at,
            self.joined_at,
            self.removed_flag,
            self.removed_at,
            self.created_at,
            self.created_by_id,
            self.created_by_type,
            self.updated_at,
            self.updated_by_id,
            self.updated_by_type,
        ))
    }
}

const SELECT_COLUMNS: &str = "id, login_id, password, token, name, use_flag, authorities, \
     change_password_at, latest_active_at, joined_at, removed_flag, removed_at, created_at, \
     created_by_id, created_by_type, updated_at, updated_by_id, updated_by_type";

pub struct UserRepository;

#[async_trait]
impl Repository for UserRepository {
    type Aggregate = User;

    async fn insert(conn: &mut SqliteConnection, user: &mut User) -> ServiceResult<()> {
        let result = sqlx::query(
            "INSERT INTO user (login_id, password, token, name, use_flag, authorities, \
             change_password_at, latest_active_at, joined_at, removed_flag, removed_at, \
             created_at, created_by_id, created_by_type, updated_at, updated_by_id, \
             updated_by_type) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.login_id)
        .bind(&user.password)
        .bind(&user.token)
        .bind(&user.name)
        .bind(user.use_flag)
        .bind(encode_authorities(&user.authorities)?)
        .bind(user.change_password_at)
        .bind(user.latest_active_at)
        .bind(user.joined_at)
        .bind(user.removed_flag)
        .bind(user.removed_at)
        .bind(user.created_at)
        .bind(user.created_by_id)
        .bind(user.created_by_type)
        .bind(user.updated_at)
        .bind(user.updated_by_id)
        .bind(user.updated_by_type)
        .execute(&mut *conn)
        .await?;
        user.id = result.last_insert_rowid();
        Ok(())
    }

    async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(UserRow::into_aggregate).transpose()
    }

    async fn persist(conn: &mut SqliteConnection, user: &User) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE user SET login_id = ?, password = ?, token = ?, name = ?, use_flag = ?, \
             authorities = ?, change_password_at = ?, latest_active_at = ?, joined_at = ?, \
             removed_flag = ?, removed_at = ?, updated_at = ?, updated_by_id = ?, \
             updated_by_type = ? \
             WHERE id = ?",
        )
        .bind(&user.login_id)
        .bind(&user.password)
        .bind(&user.token)
        .bind(&user.name)
        .bind(user.use_flag)
        .bind(encode_authorities(&user.authorities)?)
        .bind(user.change_password_at)
        .bind(user.latest_active_at)
        .bind(user.joined_at)
        .bind(user.removed_flag)
        .bind(user.removed_at)
        .bind(user.updated_at)
        .bind(user.updated_by_id)
        .bind(user.updated_by_type)
        .bind(user.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl UserRepository {
    /// Login lookup; includes removed rows so the caller can report them.
    pub async fn find_by_login_id(
        conn: &mut SqliteConnection,
        login_id: &str,
    ) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user WHERE login_id = ?"
        ))
        .bind(login_id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(UserRow::into_aggregate).transpose()
    }

    pub async fn login_id_exists(
        conn: &mut SqliteConnection,
        login_id: &str,
        exclude_id: Option<i64>,
    ) -> ServiceResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user WHERE login_id = ? AND id != ?",
        )
        .bind(login_id)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&mut *conn)
        .await?;
        Ok(count > 0)
    }

    pub async fn find_response(pool: &SqlitePool, id: i64) -> ServiceResult<Option<UserResponse>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user WHERE id = ? AND removed_flag = FALSE"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        match row {
            Some(row) => Ok(Some(UserResponse::from(&row.into_aggregate()?))),
            None => Ok(None),
        }
    }

    pub async fn list(
        pool: &SqlitePool,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<UserResponse>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user WHERE removed_flag = FALSE \
             ORDER BY id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        rows.into_iter()
            .map(|row| Ok(UserResponse::from(&row.into_aggregate()?)))
            .collect()
    }

    pub async fn count(pool: &SqlitePool) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE removed_flag = FALSE")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
