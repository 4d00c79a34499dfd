use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BatchRepository, TicketRepository};
use crate::models::batch::{CandidateBatch, NewBatch};
use crate::models::ticket::{NewTicket, SupportTicket, TicketStatus};

pub struct PgBatchRepository {
    pool: PgPool,
}

impl PgBatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchRepository for PgBatchRepository {
    async fn list(&self) -> Result<Vec<CandidateBatch>> {
        Ok(sqlx::query_as::<_, CandidateBatch>(
            "SELECT * FROM candidate_batches ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CandidateBatch>> {
        Ok(
            sqlx::query_as::<_, CandidateBatch>("SELECT * FROM candidate_batches WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create(&self, created_by: Option<&str>, batch: NewBatch) -> Result<CandidateBatch> {
        Ok(sqlx::query_as::<_, CandidateBatch>(
            r#"
            INSERT INTO candidate_batches (id, name, job_title, candidate_count, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&batch.name)
        .bind(&batch.job_title)
        .bind(batch.candidate_count)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?)
    }
}

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn list(&self, status: Option<TicketStatus>) -> Result<Vec<SupportTicket>> {
        let tickets = match status {
            Some(status) => {
                sqlx::query_as::<_, SupportTicket>(
                    "SELECT * FROM support_tickets WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SupportTicket>(
                    "SELECT * FROM support_tickets ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(tickets)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SupportTicket>> {
        Ok(sqlx::query_as::<_, SupportTicket>(
            "SELECT * FROM support_tickets WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create(&self, user_id: &str, ticket: NewTicket) -> Result<SupportTicket> {
        Ok(sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (id, user_id, subject, body, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&ticket.subject)
        .bind(&ticket.body)
        .bind(TicketStatus::Open.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<SupportTicket>> {
        Ok(sqlx::query_as::<_, SupportTicket>(
            r#"
            UPDATE support_tickets
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn count_by_status(&self) -> Result<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM support_tickets GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }
}
