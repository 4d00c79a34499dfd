use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A group of candidates screened against one job opening.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateBatch {
    pub id: Uuid,
    pub name: String,
    pub job_title: Option<String>,
    pub candidate_count: i32,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub name: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub candidate_count: i32,
}
