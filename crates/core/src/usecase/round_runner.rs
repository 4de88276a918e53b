use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::domain::error::AppError;
use crate::domain::job::{JobStatus, RoundJob};
use crate::domain::types::RoundKind;

/// ラウンドタスクの発行・追跡・キャンセル。
/// 同時に走れるラウンドは1つだけ。
pub struct RoundRunner {
    jobs: Arc<Mutex<HashMap<String, JobEntry>>>,
}

struct JobEntry {
    info: RoundJob,
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RoundRunner {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// ラウンドを Tokio タスクとして起動し、ジョブ ID を返す。
    /// キャンセルされるとタスクの future ごと破棄される。
    pub async fn start<F>(
        &self,
        session_id: String,
        round: RoundKind,
        task: F,
    ) -> Result<String, AppError>
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let mut jobs = self.jobs.lock().await;
        if let Some(active) = jobs.values().find(|e| e.info.status.is_active()) {
            return Err(AppError::invalid_state(format!(
                "{} round is already running",
                active.info.round.as_str()
            )));
        }

        let job_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let mut info = RoundJob::new(job_id.clone(), session_id, round, now);
        info.status = JobStatus::Running;
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let jobs_ref = self.jobs.clone();
        let id = job_id.clone();
        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                result = task => Some(result),
                _ = cancel_rx => None,
            };

            let mut jobs = jobs_ref.lock().await;
            if let Some(entry) = jobs.get_mut(&id) {
                if entry.info.status == JobStatus::Running {
                    match result {
                        Some(Ok(())) => entry.info.status = JobStatus::Done,
                        Some(Err(e)) => {
                            log::warn!("round job {id} failed: {e}");
                            entry.info.status = JobStatus::Failed;
                            entry.info.error = Some(e.to_string());
                        }
                        None => entry.info.status = JobStatus::Canceled,
                    }
                    entry.info.finished_at = Some(chrono::Utc::now().to_rfc3339());
                }
                entry.cancel_tx = None;
            }
        });

        log::info!("round job {job_id} started ({})", round.as_str());
        jobs.insert(
            job_id.clone(),
            JobEntry {
                info,
                cancel_tx: Some(cancel_tx),
                handle: Some(handle),
            },
        );
        Ok(job_id)
    }

    /// ジョブをキャンセル
    pub async fn cancel(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.get_mut(job_id) {
            Some(entry) => cancel_entry(entry),
            None => false,
        }
    }

    /// 実行中のジョブがあればキャンセルし、その ID を返す（画面遷移時）
    pub async fn cancel_active(&self) -> Option<String> {
        let mut jobs = self.jobs.lock().await;
        jobs.iter_mut()
            .find(|(_, e)| e.info.status.is_active())
            .and_then(|(id, entry)| cancel_entry(entry).then(|| id.clone()))
    }

    /// ジョブの終了を待つ
    pub async fn join(&self, job_id: &str) -> Option<RoundJob> {
        let handle = {
            let mut jobs = self.jobs.lock().await;
            jobs.get_mut(job_id)?.handle.take()
        };
        if let Some(handle) = handle {
            // abort 済みなら JoinError になるが状態は cancel 側で確定している
            let _ = handle.await;
        }
        self.get_job(job_id).await
    }

    /// 実行中のジョブ
    pub async fn active(&self) -> Option<RoundJob> {
        let jobs = self.jobs.lock().await;
        jobs.values()
            .find(|e| e.info.status.is_active())
            .map(|e| e.info.clone())
    }

    /// ジョブ情報を取得
    pub async fn get_job(&self, job_id: &str) -> Option<RoundJob> {
        let jobs = self.jobs.lock().await;
        jobs.get(job_id).map(|e| e.info.clone())
    }

    /// 完了済みジョブを削除（メモリ解放）
    pub async fn cleanup_completed(&self) {
        let mut jobs = self.jobs.lock().await;
        jobs.retain(|_, entry| entry.info.status.is_active());
    }
}

fn cancel_entry(entry: &mut JobEntry) -> bool {
    if !entry.info.status.is_active() {
        return false;
    }
    entry.info.status = JobStatus::Canceled;
    entry.info.finished_at = Some(chrono::Utc::now().to_rfc3339());
    if let Some(tx) = entry.cancel_tx.take() {
        let _ = tx.send(());
    }
    if let Some(handle) = &entry.handle {
        handle.abort();
    }
    log::info!(
        "round job {} canceled ({})",
        entry.info.job_id,
        entry.info.round.as_str()
    );
    true
}

impl Default for RoundRunner {
    fn default() -> Self {
        Self::new()
    }
}
