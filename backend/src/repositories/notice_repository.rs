//! Persistence for the [`Notice`] aggregate and its read-side queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::database::models::UserType;
use crate::domain::notice::{Notice, NoticeResponse};
use crate::errors::ServiceResult;
use crate::uow::Repository;

#[derive(FromRow)]
struct NoticeRow {
    id: i64,
    title: String,
    body: String,
    use_flag: bool,
    removed_flag: bool,
    removed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    created_by_id: i64,
    created_by_type: UserType,
    updated_at: DateTime<Utc>,
    updated_by_id: i64,
    updated_by_type: UserType,
}

impl NoticeRow {
    fn into_aggregate(self) -> Notice {
        Notice::from_parts(
            self.id,
            self.title,
            self.body,
            self.use_flag,
            self.removed_flag,
            self.removed_at,
            self.created_at,
            self.created_by_id,
            self.created_by_type,
            self.updated_at,
            self.updated_by_id,
            self.updated_by_type,
        )
    }
}

const SELECT_COLUMNS: &str = "id, title, body, use_flag, removed_flag, removed_at, created_at, \
     created_by_id, created_by_type, updated_at, updated_by_id, updated_by_type";

pub struct NoticeRepository;

#[async_trait]
impl Repository for NoticeRepository {
    type Aggregate = Notice;

    async fn insert(conn: &mut SqliteConnection, notice: &mut Notice) -> ServiceResult<()> {
        let result = sqlx::query(
            "INSERT INTO notice (title, body, use_flag, removed_flag, removed_at, created_at, \
             created_by_id, created_by_type, updated_at, updated_by_id, updated_by_type) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notice.title)
        .bind(&notice.body)
        .bind(notice.use_flag)
        .bind(notice.removed_flag)
        .bind(notice.removed_at)
        .bind(notice.created_at)
        .bind(notice.created_by_id)
        .bind(notice.created_by_type)
        .bind(notice.updated_at)
        .bind(notice.updated_by_id)
        .bind(notice.updated_by_type)
        .execute(&mut *conn)
        .await?;
        notice.id = result.last_insert_rowid();
        Ok(())
    }

    async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Notice>> {
        let row = sqlx::query_as::<_, NoticeRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM notice WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(NoticeRow::into_aggregate))
    }

    async fn persist(conn: &mut SqliteConnection, notice: &Notice) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE notice SET title = ?, body = ?, use_flag = ?, removed_flag = ?, \
             removed_at = ?, updated_at = ?, updated_by_id = ?, updated_by_type = ? \
             WHERE id = ?",
        )
        .bind(&notice.title)
        .bind(&notice.body)
        .bind(notice.use_flag)
        .bind(notice.removed_flag)
        .bind(notice.removed_at)
        .bind(notice.updated_at)
        .bind(notice.updated_by_id)
        .bind(notice.updated_by_type)
        .bind(notice.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl NoticeRepository {
    pub async fn find_response(
        pool: &SqlitePool,
        id: i64,
    ) -> ServiceResult<Option<NoticeResponse>> {
        let row = sqlx::query_as::<_, NoticeRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM notice WHERE id = ? AND removed_flag = FALSE"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|row| NoticeResponse::from(&row.into_aggregate())))
    }

    pub async fn list(
        pool: &SqlitePool,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<NoticeResponse>> {
        let rows = sqlx::query_as::<_, NoticeRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM notice WHERE removed_flag = FALSE \
             ORDER BY id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| NoticeResponse::from(&row.into_aggregate()))
            .collect())
    }

    pub async fn count(pool: &SqlitePool) -> ServiceResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notice WHERE removed_flag = FALSE")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Operator;
    use crate::domain::notice::NoticeCreate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn notice(title: &str) -> Notice {
        Notice::new(
            NoticeCreate {
                title: title.into(),
                body: "body".into(),
                use_flag: true,
            },
            1,
        )
    }

    #[tokio::test]
    async fn removed_notice_disappears_from_reads() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut created = notice("maintenance window");
        NoticeRepository::insert(&mut conn, &mut created).await.unwrap();

        created.remove(1);
        NoticeRepository::persist(&mut conn, &created).await.unwrap();
        drop(conn);

        assert!(
            NoticeRepository::find_response(&pool, created.id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(NoticeRepository::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        for title in ["first", "second"] {
            let mut created = notice(title);
            NoticeRepository::insert(&mut conn, &mut created).await.unwrap();
        }
        drop(conn);

        let listed = NoticeRepository::list(&pool, 0, 10).await.unwrap();
        let titles: Vec<_> = listed.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }
}
