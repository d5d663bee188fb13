//! In-memory job registry
//!
//! Mirrors the durable store for jobs live in this process, and carries the
//! per-job change-notifier the push channel waits on. The notifier is a
//! `watch` channel: edge-triggered, coalescing (many updates before a read
//! collapse to one wakeup), and shared by any number of observers.
//!
//! Entries are never garbage-collected; a process restart is the only way to
//! drop them.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Live job status as observed by clients.
///
/// A freshly submitted job is `pending` until a worker picks it up; the
/// durable row is `queued` over the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl LiveStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<crate::domain::entities::JobStatus> for LiveStatus {
    fn from(status: crate::domain::entities::JobStatus) -> Self {
        use crate::domain::entities::JobStatus;
        match status {
            // A queued durable row reads as pending to clients
            JobStatus::Queued => LiveStatus::Pending,
            JobStatus::Processing => LiveStatus::Processing,
            JobStatus::Completed => LiveStatus::Completed,
            JobStatus::Failed => LiveStatus::Failed,
        }
    }
}

/// In-memory mirror of a job
#[derive(Debug, Clone, Serialize)]
pub struct LiveJob {
    pub job_id: Uuid,
    pub status: LiveStatus,
    pub asset_id: Option<i64>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LiveJob {
    fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: LiveStatus::Pending,
            asset_id: None,
            result_url: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }
}

/// Partial update overlaid onto a live job
#[derive(Debug, Clone, Default)]
pub struct LiveJobUpdate {
    pub status: Option<LiveStatus>,
    pub asset_id: Option<i64>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
}

impl LiveJobUpdate {
    pub fn status(status: LiveStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn completed(asset_id: i64, result_url: String) -> Self {
        Self {
            status: Some(LiveStatus::Completed),
            asset_id: Some(asset_id),
            result_url: Some(result_url),
            error_message: None,
        }
    }

    pub fn failed(error_message: String) -> Self {
        Self {
            status: Some(LiveStatus::Failed),
            error_message: Some(error_message),
            ..Self::default()
        }
    }
}

struct LiveEntry {
    job: LiveJob,
    notify: watch::Sender<u64>,
}

/// Registry of live jobs. One mutex guards map mutation and notifier fire,
/// so observers never see an update without its wakeup.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, LiveEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a live entry for a job. Re-creating an existing id resets it.
    pub fn create(&self, job_id: Uuid) -> LiveJob {
        let job = LiveJob::new(job_id);
        let (notify, _) = watch::channel(0u64);
        let mut jobs = self.jobs.lock().expect("job registry poisoned");
        jobs.insert(job_id, LiveEntry {
            job: job.clone(),
            notify,
        });
        job
    }

    /// Check whether a live entry exists
    pub fn contains(&self, job_id: Uuid) -> bool {
        self.jobs
            .lock()
            .expect("job registry poisoned")
            .contains_key(&job_id)
    }

    /// Overlay a partial update and fire the job's change-notifier exactly
    /// once. Unknown ids are ignored (the entry may predate a restart).
    pub fn update(&self, job_id: Uuid, update: LiveJobUpdate) {
        let mut jobs = self.jobs.lock().expect("job registry poisoned");
        let Some(entry) = jobs.get_mut(&job_id) else {
            tracing::warn!(job_id = %job_id, "Update for unknown live job dropped");
            return;
        };

        if let Some(status) = update.status {
            entry.job.status = status;
        }
        if let Some(asset_id) = update.asset_id {
            entry.job.asset_id = Some(asset_id);
        }
        if let Some(result_url) = update.result_url {
            entry.job.result_url = Some(result_url);
        }
        if let Some(error_message) = update.error_message {
            entry.job.error_message = Some(error_message);
        }

        entry.notify.send_modify(|version| *version += 1);
    }

    /// Non-blocking snapshot of the current state
    pub fn get(&self, job_id: Uuid) -> Option<LiveJob> {
        self.jobs
            .lock()
            .expect("job registry poisoned")
            .get(&job_id)
            .map(|entry| entry.job.clone())
    }

    /// Snapshot plus a subscription to subsequent changes. The receiver's
    /// seen-version is aligned with the snapshot, so an update racing this
    /// call wakes the observer instead of being lost.
    pub fn watch(&self, job_id: Uuid) -> Option<(LiveJob, watch::Receiver<u64>)> {
        let jobs = self.jobs.lock().expect("job registry poisoned");
        jobs.get(&job_id)
            .map(|entry| (entry.job.clone(), entry.notify.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_create_defaults_to_pending() {
        let registry = JobRegistry::new();
        let id = Uuid::new_v4();
        let job = registry.create(id);
        assert_eq!(job.status, LiveStatus::Pending);
        assert!(registry.contains(id));
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn test_update_overlays_partial_fields() {
        let registry = JobRegistry::new();
        let id = Uuid::new_v4();
        registry.create(id);

        registry.update(id, LiveJobUpdate::status(LiveStatus::Processing));
        let job = registry.get(id).unwrap();
        assert_eq!(job.status, LiveStatus::Processing);
        assert!(job.asset_id.is_none());

        registry.update(
            id,
            LiveJobUpdate::completed(42, "/storage/images/x.png".to_string()),
        );
        let job = registry.get(id).unwrap();
        assert_eq!(job.status, LiveStatus::Completed);
        assert_eq!(job.asset_id, Some(42));
        assert_eq!(job.result_url.as_deref(), Some("/storage/images/x.png"));
    }

    #[test]
    fn test_update_unknown_job_is_dropped() {
        let registry = JobRegistry::new();
        // Must not panic or create an entry
        registry.update(Uuid::new_v4(), LiveJobUpdate::status(LiveStatus::Failed));
    }

    #[tokio::test]
    async fn test_notifier_wakes_observer_on_update() {
        let registry = Arc::new(JobRegistry::new());
        let id = Uuid::new_v4();
        registry.create(id);

        let (_snapshot, mut rx) = registry.watch(id).unwrap();

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                rx.changed().await.expect("sender alive");
                registry.get(id).unwrap().status
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        registry.update(id, LiveJobUpdate::status(LiveStatus::Processing));

        let observed = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("observer woke up")
            .unwrap();
        assert_eq!(observed, LiveStatus::Processing);
    }

    #[tokio::test]
    async fn test_notifier_coalesces_rapid_updates() {
        let registry = JobRegistry::new();
        let id = Uuid::new_v4();
        registry.create(id);

        let (_snapshot, mut rx) = registry.watch(id).unwrap();

        // Two updates before the observer reads: one wakeup, latest state
        registry.update(id, LiveJobUpdate::status(LiveStatus::Processing));
        registry.update(
            id,
            LiveJobUpdate::completed(7, "/storage/videos/x.mp4".to_string()),
        );

        rx.changed().await.unwrap();
        let job = registry.get(id).unwrap();
        assert_eq!(job.status, LiveStatus::Completed);

        // The edge was consumed; no stale edge is queued
        let pending =
            tokio::time::timeout(Duration::from_millis(50), rx.changed()).await;
        assert!(pending.is_err(), "no further wakeup expected");
    }

    #[tokio::test]
    async fn test_notifiers_are_independent_across_jobs() {
        let registry = JobRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.create(a);
        registry.create(b);

        let (_job_b, mut rx_b) = registry.watch(b).unwrap();

        registry.update(a, LiveJobUpdate::status(LiveStatus::Processing));

        let woken = tokio::time::timeout(Duration::from_millis(50), rx_b.changed()).await;
        assert!(woken.is_err(), "job B must not observe job A's update");
    }

    #[tokio::test]
    async fn test_multiple_observers_all_wake() {
        let registry = Arc::new(JobRegistry::new());
        let id = Uuid::new_v4();
        registry.create(id);

        let (_s1, mut rx1) = registry.watch(id).unwrap();
        let (_s2, mut rx2) = registry.watch(id).unwrap();

        registry.update(id, LiveJobUpdate::failed("boom".to_string()));

        tokio::time::timeout(Duration::from_secs(1), rx1.changed())
            .await
            .expect("observer 1 woke")
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx2.changed())
            .await
            .expect("observer 2 woke")
            .unwrap();
    }
}
