use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{BatchRepository, TicketRepository};
use crate::models::batch::{CandidateBatch, NewBatch};
use crate::models::ticket::{NewTicket, SupportTicket, TicketStatus};

/// Process-local batch storage, used without a database.
#[derive(Default)]
pub struct MemoryBatchRepository {
    batches: RwLock<Vec<CandidateBatch>>,
}

#[async_trait]
impl BatchRepository for MemoryBatchRepository {
    async fn list(&self) -> Result<Vec<CandidateBatch>> {
        let batches = self.batches.read().map_err(|_| anyhow!("batch store poisoned"))?;
        Ok(batches.iter().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CandidateBatch>> {
        let batches = self.batches.read().map_err(|_| anyhow!("batch store poisoned"))?;
        Ok(batches.iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, created_by: Option<&str>, batch: NewBatch) -> Result<CandidateBatch> {
        let row = CandidateBatch {
            id: Uuid::new_v4(),
            name: batch.name,
            job_title: batch.job_title,
            candidate_count: batch.candidate_count,
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
        };
        self.batches
            .write()
            .map_err(|_| anyhow!("batch store poisoned"))?
            .push(row.clone());
        Ok(row)
    }
}

/// Process-local ticket storage, used without a database.
#[derive(Default)]
pub struct MemoryTicketRepository {
    tickets: RwLock<Vec<SupportTicket>>,
}

#[async_trait]
impl TicketRepository for MemoryTicketRepository {
    async fn list(&self, status: Option<TicketStatus>) -> Result<Vec<SupportTicket>> {
        let tickets = self.tickets.read().map_err(|_| anyhow!("ticket store poisoned"))?;
        Ok(tickets
            .iter()
            .rev()
            .filter(|t| status.map_or(true, |s| t.status == s.as_str()))
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SupportTicket>> {
        let tickets = self.tickets.read().map_err(|_| anyhow!("ticket store poisoned"))?;
        Ok(tickets
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, user_id: &str, ticket: NewTicket) -> Result<SupportTicket> {
        let now = Utc::now();
        let row = SupportTicket {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            subject: ticket.subject,
            body: ticket.body,
            status: TicketStatus::Open.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tickets
            .write()
            .map_err(|_| anyhow!("ticket store poisoned"))?
            .push(row.clone());
        Ok(row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<SupportTicket>> {
        let mut tickets = self.tickets.write().map_err(|_| anyhow!("ticket store poisoned"))?;
        Ok(tickets.iter_mut().find(|t| t.id == id).map(|t| {
            t.status = status.as_str().to_string();
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn count_by_status(&self) -> Result<BTreeMap<String, i64>> {
        let tickets = self.tickets.read().map_err(|_| anyhow!("ticket store poisoned"))?;
        let mut counts = BTreeMap::new();
        for ticket in tickets.iter() {
            *counts.entry(ticket.status.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
