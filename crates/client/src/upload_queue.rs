//! Sequential attachment upload with per-file progress.
//!
//! Files are validated when added; invalid files are marked failed and never
//! sent. Uploading walks the pending files one at a time and carries on after
//! a failure.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use serde::Serialize;

use hmis_core::DomainError;
use hmis_radiology::{UploadCandidate, UploadRules};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

type Listener = Arc<dyn Fn(u8) + Send + Sync>;

/// Shared upload progress in whole percent (0..=100).
#[derive(Clone, Default)]
pub struct Progress {
    percent: Arc<AtomicU8>,
    listener: Option<Listener>,
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Progress").field(&self.get()).finish()
    }
}

impl Progress {
    /// Progress that also calls `listener` with every update, e.g. to redraw
    /// a progress bar.
    pub fn with_listener(listener: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            percent: Arc::default(),
            listener: Some(Arc::new(listener)),
        }
    }

    pub fn get(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    pub fn set(&self, percent: u8) {
        let percent = percent.min(100);
        self.percent.store(percent, Ordering::Relaxed);
        if let Some(listener) = &self.listener {
            listener(percent);
        }
    }

    /// Record `loaded` of `total` bytes sent, rounded to the nearest percent.
    pub fn report(&self, loaded: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percent = ((loaded.min(total) as f64 / total as f64) * 100.0).round() as u8;
        self.set(percent);
    }
}

/// Sends one file. Implementations report byte progress through `progress`
/// when the transport exposes it.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        file: &UploadCandidate,
        contents: &[u8],
        progress: &Progress,
    ) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct QueuedFile {
    pub id: u64,
    pub file: UploadCandidate,
    contents: Arc<[u8]>,
    pub status: UploadStatus,
    pub progress: Progress,
    pub error: Option<String>,
}

/// Outcome of one [`UploadQueue::upload_all`] run.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    rules: UploadRules,
    items: Vec<QueuedFile>,
    next_id: u64,
}

impl UploadQueue {
    pub fn new(rules: UploadRules) -> Self {
        Self {
            rules,
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Queue a file. Returns its id; a file failing validation is queued in
    /// the error state with the validation message.
    pub fn add(&mut self, file: UploadCandidate, contents: impl Into<Arc<[u8]>>) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;

        let error = self.validation_error(&file);
        if let Some(msg) = &error {
            tracing::info!(file = %file.name, error = %msg, "rejected attachment");
        }

        self.items.push(QueuedFile {
            id,
            status: if error.is_some() { UploadStatus::Error } else { UploadStatus::Pending },
            file,
            contents: contents.into(),
            progress: Progress::default(),
            error,
        });
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|f| f.id != id);
        self.items.len() != before
    }

    pub fn items(&self) -> &[QueuedFile] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&QueuedFile> {
        self.items.iter().find(|f| f.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.count(UploadStatus::Pending)
    }

    pub fn has_errors(&self) -> bool {
        self.count(UploadStatus::Error) > 0
    }

    /// Every file has either succeeded or failed.
    pub fn is_settled(&self) -> bool {
        self.items
            .iter()
            .all(|f| matches!(f.status, UploadStatus::Success | UploadStatus::Error))
    }

    /// Put a failed file back in the queue. It is re-validated first, so a
    /// file rejected for its type or size stays failed.
    pub fn retry(&mut self, id: u64) -> bool {
        let Some(idx) = self.items.iter().position(|f| f.id == id) else {
            return false;
        };
        if self.items[idx].status != UploadStatus::Error {
            return false;
        }

        let error = self.validation_error(&self.items[idx].file);
        let item = &mut self.items[idx];
        item.progress.set(0);
        match error {
            Some(msg) => {
                item.error = Some(msg);
                false
            }
            None => {
                item.status = UploadStatus::Pending;
                item.error = None;
                true
            }
        }
    }

    /// Drop files that finished successfully.
    pub fn clear_uploaded(&mut self) {
        self.items.retain(|f| f.status != UploadStatus::Success);
    }

    /// Upload every pending file, one at a time, in queue order.
    pub async fn upload_all<U: Uploader + ?Sized>(&mut self, uploader: &U) -> UploadReport {
        let mut report = UploadReport::default();

        for item in self.items.iter_mut().filter(|f| f.status == UploadStatus::Pending) {
            item.status = UploadStatus::Uploading;
            item.progress.set(0);

            match uploader.upload(&item.file, &item.contents, &item.progress).await {
                Ok(()) => {
                    item.status = UploadStatus::Success;
                    item.progress.set(100);
                    report.uploaded += 1;
                }
                Err(msg) => {
                    tracing::warn!(file = %item.file.name, error = %msg, "attachment upload failed");
                    item.status = UploadStatus::Error;
                    item.error = Some(msg);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(uploaded = report.uploaded, failed = report.failed, "upload run finished");
        report
    }

    fn count(&self, status: UploadStatus) -> usize {
        self.items.iter().filter(|f| f.status == status).count()
    }

    fn validation_error(&self, file: &UploadCandidate) -> Option<String> {
        match self.rules.validate(file) {
            Ok(()) => None,
            Err(DomainError::Validation(msg)) => Some(msg),
            Err(other) => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails files whose name contains "bad"; records upload order.
    #[derive(Default)]
    struct FakeUploader {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Uploader for FakeUploader {
        async fn upload(
            &self,
            file: &UploadCandidate,
            contents: &[u8],
            progress: &Progress,
        ) -> Result<(), String> {
            self.sent.lock().unwrap().push(file.name.clone());
            progress.report(contents.len() as u64 / 3, contents.len() as u64);
            if file.name.contains("bad") {
                Err("Upload failed".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn png(name: &str) -> UploadCandidate {
        UploadCandidate::new(name, "image/png", 3)
    }

    #[test]
    fn listener_sees_every_update() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::with_listener(move |p| sink.lock().unwrap().push(p));

        progress.report(1, 4);
        progress.report(3, 4);
        progress.report(9, 4);
        progress.report(1, 0);

        assert_eq!(*seen.lock().unwrap(), vec![25, 75, 100]);
        assert_eq!(progress.get(), 100);
    }

    #[test]
    fn invalid_files_are_marked_at_add_time() {
        let mut queue = UploadQueue::new(UploadRules::default());
        let id = queue.add(UploadCandidate::new("notes.txt", "text/plain", 10), vec![0u8; 10]);

        let item = queue.get(id).unwrap();
        assert_eq!(item.status, UploadStatus::Error);
        assert_eq!(item.error.as_deref(), Some("Invalid file type. Accepted: JPEG, PNG, PDF"));
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn continues_after_a_failure() {
        let mut queue = UploadQueue::new(UploadRules::default());
        let first = queue.add(png("lateral.png"), vec![1u8, 2, 3]);
        let bad = queue.add(png("bad-scan.png"), vec![1u8, 2, 3]);
        let last = queue.add(png("ap.png"), vec![1u8, 2, 3]);
        let rejected = queue.add(UploadCandidate::new("x.gif", "image/gif", 3), vec![1u8, 2, 3]);

        let uploader = FakeUploader::default();
        let report = queue.upload_all(&uploader).await;

        assert_eq!(report, UploadReport { uploaded: 2, failed: 1 });
        assert_eq!(
            *uploader.sent.lock().unwrap(),
            vec!["lateral.png", "bad-scan.png", "ap.png"]
        );
        assert_eq!(queue.get(first).unwrap().status, UploadStatus::Success);
        assert_eq!(queue.get(first).unwrap().progress.get(), 100);
        assert_eq!(queue.get(bad).unwrap().status, UploadStatus::Error);
        assert_eq!(queue.get(bad).unwrap().progress.get(), 33);
        assert_eq!(queue.get(last).unwrap().status, UploadStatus::Success);
        assert_eq!(queue.get(rejected).unwrap().status, UploadStatus::Error);
        assert!(queue.is_settled());
        assert!(queue.has_errors());
    }

    #[tokio::test]
    async fn retry_resubmits_only_the_failed_file() {
        let mut queue = UploadQueue::new(UploadRules::default());
        queue.add(png("ok.png"), vec![1u8, 2, 3]);
        let bad = queue.add(png("bad.png"), vec![1u8, 2, 3]);
        queue.upload_all(&FakeUploader::default()).await;

        assert!(queue.retry(bad));
        assert_eq!(queue.get(bad).unwrap().status, UploadStatus::Pending);
        assert_eq!(queue.get(bad).unwrap().progress.get(), 0);

        let uploader = FakeUploader::default();
        queue.upload_all(&uploader).await;
        assert_eq!(*uploader.sent.lock().unwrap(), vec!["bad.png"]);

        queue.clear_uploaded();
        assert_eq!(queue.items().len(), 1);
    }

    #[test]
    fn retry_keeps_invalid_files_failed() {
        let mut queue = UploadQueue::new(UploadRules::default());
        let id = queue.add(UploadCandidate::new("huge.pdf", "application/pdf", u64::MAX), Vec::new());
        assert!(!queue.retry(id));
        assert_eq!(queue.get(id).unwrap().status, UploadStatus::Error);
        assert!(!queue.retry(999));
    }

    #[test]
    fn progress_rounds_to_whole_percent() {
        let p = Progress::default();
        p.report(1, 3);
        assert_eq!(p.get(), 33);
        p.report(2, 3);
        assert_eq!(p.get(), 67);
        p.report(10, 3);
        assert_eq!(p.get(), 100);
    }
}
