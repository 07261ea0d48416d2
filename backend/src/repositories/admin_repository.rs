//! Persistence for the [`Admin`] aggregate and its read-side queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::database::models::UserType;
use crate::domain::admin::{Admin, AdminResponse};
use crate::errors::ServiceResult;
use crate::repositories::{decode_authorities, encode_authorities};
use crate::uow::Repository;

#[derive(FromRow)]
struct AdminRow {
    id: i64,
    login_id: String,
    password: Option<String>,
    token: Option<String>,
    name: String,
    use_flag: bool,
    manager_flag: bool,
    authorities: String,
    verify_flag: bool,
    verify_token: Option<String>,
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

impl AdminRow {
    fn into_aggregate(self) -> ServiceResult<Admin> {
        let authorities = decode_authorities(&self.authorities)?;
        Ok(Admin::from_parts(
            self.id,
            self.login_id,
            self.password,
            self.token,
            self.name,
            self.use_flag,
            self.manager_flag,
            authorities,
            self.verify_flag,
            self.verify_token,
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

const SELECT_COLUMNS: &str = "id, login_id, password, token, name, use_flag, manager_flag, \
     authorities, verify_flag, verify_token, change_password_at, latest_active_at, joined_at, \
     removed_flag, removed_at, created_at, created_by_id, created_by_type, updated_at, \
     updated_by_id, updated_by_type";

pub struct AdminRepository;

#[async_trait]
impl Repository for AdminRepository {
    type Aggregate = Admin;

    async fn insert(conn: &mut SqliteConnection, admin: &mut Admin) -> ServiceResult<()> {
        let result = sqlx::query(
            "INSERT INTO admin (login_id, password, token, name, use_flag, manager_flag, \
             authorities, verify_flag, verify_token, change_password_at, latest_active_at, \
             joined_at, removed_flag, removed_at, created_at, created_by_id, created_by_type, \
             updated_at, updated_by_id, updated_by_type) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&admin.login_id)
        .bind(&admin.password)
        .bind(&admin.token)
        .bind(&admin.name)
        .bind(admin.use_flag)
        .bind(admin.manager_flag)
        .bind(encode_authorities(&admin.authorities)?)
        .bind(admin.verify_flag)
        .bind(&admin.verify_token)
        .bind(admin.change_password_at)
        .bind(admin.latest_active_at)
        .bind(admin.joined_at)
        .bind(admin.removed_flag)
        .bind(admin.removed_at)
        .bind(admin.created_at)
        .bind(admin.created_by_id)
        .bind(admin.created_by_type)
        .bind(admin.updated_at)
        .bind(admin.updated_by_id)
        .bind(admin.updated_by_type)
        .execute(&mut *conn)
        .await?;
        admin.id = result.last_insert_rowid();
        Ok(())
    }

    async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(AdminRow::into_aggregate).transpose()
    }

    async fn persist(conn: &mut SqliteConnection, admin: &Admin) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE admin SET login_id = ?, password = ?, token = ?, name = ?, use_flag = ?, \
             manager_flag = ?, authorities = ?, verify_flag = ?, verify_token = ?, \
             change_password_at = ?, latest_active_at = ?, joined_at = ?, removed_flag = ?, \
             removed_at = ?, updated_at = ?, updated_by_id = ?, updated_by_type = ? \
             WHERE id = ?",
        )
        .bind(&admin.login_id)
        .bind(&admin.password)
        .bind(&admin.token)
        .bind(&admin.name)
        .bind(admin.use_flag)
        .bind(admin.manager_flag)
        .bind(encode_authorities(&admin.authorities)?)
        .bind(admin.verify_flag)
        .bind(&admin.verify_token)
        .bind(admin.change_password_at)
        .bind(admin.latest_active_at)
        .bind(admin.joined_at)
        .bind(admin.removed_flag)
        .bind(admin.removed_at)
        .bind(admin.updated_at)
        .bind(admin.updated_by_id)
        .bind(admin.updated_by_type)
        .bind(admin.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl AdminRepository {
    /// Login lookup; includes removed rows so the caller can report them.
    pub async fn find_by_login_id(
        conn: &mut SqliteConnection,
        login_id: &str,
    ) -> ServiceResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin WHERE login_id = ?"
        ))
        .bind(login_id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(AdminRow::into_aggregate).transpose()
    }

    /// Duplicate check for create/update; `exclude_id` skips the row being
    /// edited.
    pub async fn login_id_exists(
        conn: &mut SqliteConnection,
        login_id: &str,
        exclude_id: Option<i64>,
    ) -> ServiceResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin WHERE login_id = ? AND id != ?",
        )
        .bind(login_id)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&mut *conn)
        .await?;
        Ok(count > 0)
    }

    /// Hard delete, used only to supersede an unverified invite. Verified
    /// accounts are always soft-deleted.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
        sqlx::query("DELETE FROM admin WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn find_response(pool: &SqlitePool, id: i64) -> ServiceResult<Option<AdminResponse>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin WHERE id = ? AND removed_flag = FALSE"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        match row {
            Some(row) => Ok(Some(AdminResponse::from(&row.into_aggregate()?))),
            None => Ok(None),
        }
    }

    pub async fn list(
        pool: &SqlitePool,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<AdminResponse>> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin WHERE removed_flag = FALSE \
             ORDER BY id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        rows.into_iter()
            .map(|row| Ok(AdminResponse::from(&row.into_aggregate()?)))
            .collect()
    }

    pub async fn count(pool: &SqlitePool) -> ServiceResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin WHERE removed_flag = FALSE")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Authority;
    use crate::domain::admin::AdminCreate;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::BTreeSet;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn admin(login_id: &str) -> Admin {
        Admin::new(
            AdminCreate {
                login_id: login_id.into(),
                name: "Ops".into(),
                use_flag: true,
                manager_flag: false,
                authorities: BTreeSet::from([Authority::AdminView, Authority::NoticeEdit]),
            },
            1,
        )
    }

    #[tokio::test]
    async fn insert_fetch_round_trip_preserves_authorities() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut created = admin("ops@example.com");
        AdminRepository::insert(&mut conn, &mut created).await.unwrap();
        assert!(created.id > 0);

        let loaded = AdminRepository::fetch(&mut conn, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.login_id, "ops@example.com");
        assert_eq!(
            loaded.authorities,
            BTreeSet::from([Authority::AdminView, Authority::NoticeEdit])
        );
        assert_eq!(loaded.verify_token, created.verify_token);
        assert!(!loaded.verify_flag);
    }

    #[tokio::test]
    async fn delete_discards_the_row() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut created = admin("ops@example.com");
        AdminRepository::insert(&mut conn, &mut created).await.unwrap();

        AdminRepository::delete(&mut conn, created.id).await.unwrap();
        let fetched = AdminRepository::fetch(&mut conn, created.id).await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn persist_writes_back_mutations() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut created = admin("ops@example.com");
        AdminRepository::insert(&mut conn, &mut created).await.unwrap();

        created.renew_token("refresh-token".into());
        AdminRepository::persist(&mut conn, &created).await.unwrap();

        let loaded = AdminRepository::fetch(&mut conn, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.token.as_deref(), Some("refresh-token"));
    }

    #[tokio::test]
    async fn login_id_exists_skips_excluded_row() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut created = admin("ops@example.com");
        AdminRepository::insert(&mut conn, &mut created).await.unwrap();

        assert!(
            AdminRepository::login_id_exists(&mut conn, "ops@example.com", None)
                .await
                .unwrap()
        );
        assert!(
            !AdminRepository::login_id_exists(&mut conn, "ops@example.com", Some(created.id))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn removed_rows_are_fetchable_but_not_listed() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut created = admin("ops@example.com");
        AdminRepository::insert(&mut conn, &mut created).await.unwrap();
        created.remove(1);
        AdminRepository::persist(&mut conn, &created).await.unwrap();
        drop(conn);

        let listed = AdminRepository::list(&pool, 0, 10).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(AdminRepository::count(&pool).await.unwrap(), 0);

        let mut conn = pool.acquire().await.unwrap();
        let fetched = AdminRepository::fetch(&mut conn, created.id).await.unwrap();
        assert!(fetched.is_some_and(|a| a.removed_flag));
    }
}
