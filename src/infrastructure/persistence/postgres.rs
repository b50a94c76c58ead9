use std::error::Error;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::helpers::err_to_boxed_send_sync;
use crate::domain::models::event_record::EventRoleRecord;

use super::{Database, DeleteDataResponse, InsertDataResponse};

#[derive(Debug)]
pub struct PostgresDatabase {
    pub pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn create_event_record(
        &self,
        event_id: &str,
        role_id: &str,
    ) -> Result<InsertDataResponse, Box<dyn Error + Send + Sync>> {
        let uuid = Uuid::new_v4();
        sqlx::query(
            "
        INSERT INTO event_role_records (id, event_id, role_id, created_at)
        VALUES ($1, $2, $3, $4)
        ",
        )
        .bind(uuid)
        .bind(event_id)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(err_to_boxed_send_sync)
        .map(|response| InsertDataResponse::Postgres(response.rows_affected()))
    }

    async fn find_event_record(
        &self,
        event_id: &str,
    ) -> Result<Option<EventRoleRecord>, Box<dyn Error + Send + Sync>> {
        sqlx::query_as::<_, EventRoleRecord>(
            r#"
        SELECT id, event_id, role_id, created_at FROM event_role_records WHERE event_id = $1"#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(err_to_boxed_send_sync)
    }

    async fn delete_event_record(
        &self,
        event_id: &str,
    ) -> Result<DeleteDataResponse, Box<dyn Error + Send + Sync>> {
        sqlx::query("DELETE FROM event_role_records WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(err_to_boxed_send_sync)
            .map(|response| DeleteDataResponse::Postgres(response.rows_affected()))
    }
}
