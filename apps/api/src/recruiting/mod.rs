//! Candidate batches, support tickets and the analytics overview.
//!
//! These are the read-mostly resources the HTTP cache sits in front of.
//! Storage is behind [`BatchRepository`] and [`TicketRepository`]: Postgres
//! when a database is configured, in-process otherwise.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::batch::{CandidateBatch, NewBatch};
use crate::models::ticket::{NewTicket, SupportTicket, TicketStatus};

pub mod handlers;
pub mod memory;
pub mod postgres;

pub use memory::{MemoryBatchRepository, MemoryTicketRepository};
pub use postgres::{PgBatchRepository, PgTicketRepository};

#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Newest first.
    async fn list(&self) -> Result<Vec<CandidateBatch>>;

    async fn get(&self, id: Uuid) -> Result<Option<CandidateBatch>>;

    async fn create(&self, created_by: Option<&str>, batch: NewBatch) -> Result<CandidateBatch>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Newest first, optionally restricted to one status.
    async fn list(&self, status: Option<TicketStatus>) -> Result<Vec<SupportTicket>>;

    /// Tickets opened by one caller, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SupportTicket>>;

    async fn create(&self, user_id: &str, ticket: NewTicket) -> Result<SupportTicket>;

    /// `None` when no ticket has this id.
    async fn update_status(&self, id: Uuid, status: TicketStatus)
        -> Result<Option<SupportTicket>>;

    async fn count_by_status(&self) -> Result<BTreeMap<String, i64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_batches: usize,
    pub total_candidates: i64,
    pub open_tickets: i64,
    pub tickets_by_status: BTreeMap<String, i64>,
}

/// Aggregates counters across both repositories.
pub async fn overview(
    batches: &dyn BatchRepository,
    tickets: &dyn TicketRepository,
) -> Result<Overview> {
    let all_batches = batches.list().await?;
    let mut tickets_by_status = tickets.count_by_status().await?;
    for status in TicketStatus::ALL {
        tickets_by_status.entry(status.as_str().to_string()).or_insert(0);
    }

    Ok(Overview {
        total_batches: all_batches.len(),
        total_candidates: all_batches.iter().map(|b| i64::from(b.candidate_count)).sum(),
        open_tickets: tickets_by_status
            .get(TicketStatus::Open.as_str())
            .copied()
            .unwrap_or(0),
        tickets_by_status,
    })
}
