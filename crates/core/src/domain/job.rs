use serde::Serialize;

use super::types::RoundKind;

/// ラウンドジョブ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

/// ラウンドジョブのメタデータ
#[derive(Debug, Clone, Serialize)]
pub struct RoundJob {
    pub job_id: String,
    pub session_id: String,
    pub round: RoundKind,
    pub status: JobStatus,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub error: Option<String>,
}

impl RoundJob {
    pub fn new(job_id: String, session_id: String, round: RoundKind, now: String) -> Self {
        Self {
            job_id,
            session_id,
            round,
            status: JobStatus::Queued,
            created_at: now,
            finished_at: None,
            error: None,
        }
    }
}
