//! A small in-process job queue: each submitted job runs one video through
//! the pipeline on a fixed pool of worker threads, and its status can be
//! polled by id.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle},
};

use indexmap::IndexMap;
use log::{debug, error, info};
use serde::Serialize;

use crate::{error::PipelineError, pipeline::PipelineOutput};

pub type JobId = u64;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobStatus {
    Pending,
    Running,
    #[serde(rename_all = "camelCase")]
    Done {
        artifact: PathBuf,
        records_written: usize,
    },
    Failed {
        error: String,
    },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Done { .. } | JobStatus::Failed { .. })
    }
}

type Job = Box<dyn FnOnce() -> Result<PipelineOutput, PipelineError> + Send + 'static>;
type StatusMap = Arc<Mutex<IndexMap<JobId, JobStatus>>>;

pub struct JobQueue {
    sender: Option<Sender<(JobId, Job)>>,
    statuses: StatusMap,
    next_id: AtomicU64,
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    pub fn new(worker_count: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<(JobId, Job)>();
        let receiver = Arc::new(Mutex::new(receiver));
        let statuses: StatusMap = Arc::new(Mutex::new(IndexMap::new()));

        let workers = (0..worker_count.max(1))
            .map(|i| {
                let receiver = Arc::clone(&receiver);
                let statuses = Arc::clone(&statuses);
                thread::spawn(move || worker_loop(i, receiver, statuses))
            })
            .collect();

        JobQueue {
            sender: Some(sender),
            statuses,
            next_id: AtomicU64::new(1),
            workers,
        }
    }

    /// Queue a job; the closure should build its own collaborators so that
    /// no calibration or tracker state is shared between jobs
    pub fn submit<F>(&self, job: F) -> JobId
    where
        F: FnOnce() -> Result<PipelineOutput, PipelineError> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        set_status(&self.statuses, id, JobStatus::Pending);

        let sent = match &self.sender {
            Some(sender) => sender.send((id, Box::new(job))).is_ok(),
            None => false,
        };
        if !sent {
            error!("Job {} could not be queued; no workers running", id);
            set_status(
                &self.statuses,
                id,
                JobStatus::Failed {
                    error: String::from("job queue is shut down"),
                },
            );
        }
        debug!("Submitted job {}", id);
        id
    }

    pub fn status(&self, id: JobId) -> Option<JobStatus> {
        self.statuses
            .lock()
            .ok()
            .and_then(|map| map.get(&id).cloned())
    }

    /// Snapshot of every job's status, in submission order
    pub fn statuses(&self) -> IndexMap<JobId, JobStatus> {
        self.statuses
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default()
    }

    /// Stop accepting jobs, wait for the queued ones to finish and return
    /// their final statuses
    pub fn join(mut self) -> IndexMap<JobId, JobStatus> {
        self.shutdown();
        self.statuses()
    }

    fn shutdown(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Job worker thread panicked");
            }
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(worker: usize, receiver: Arc<Mutex<Receiver<(JobId, Job)>>>, statuses: StatusMap) {
    loop {
        let next = match receiver.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok((id, job)) = next else {
            debug!("Worker {} stopping; queue closed", worker);
            break;
        };

        info!("Worker {} running job {}", worker, id);
        set_status(&statuses, id, JobStatus::Running);

        let status = match catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(output)) => {
                info!("Job {} done: {:?}", id, output.artifact_path);
                JobStatus::Done {
                    artifact: output.artifact_path,
                    records_written: output.records_written,
                }
            }
            Ok(Err(e)) => {
                error!("Job {} failed: {}", id, error_chain(&e));
                JobStatus::Failed {
                    error: error_chain(&e),
                }
            }
            Err(_) => {
                error!("Job {} panicked", id);
                JobStatus::Failed {
                    error: String::from("job panicked"),
                }
            }
        };
        set_status(&statuses, id, status);
    }
}

fn set_status(statuses: &StatusMap, id: JobId, status: JobStatus) {
    if let Ok(mut map) = statuses.lock() {
        map.insert(id, status);
    }
}

/// "outer: inner: innermost", so the failing stage and its cause both show
pub fn error_chain(e: &dyn std::error::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        text.push_str(": ");
        text.push_str(&s.to_string());
        source = s.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{court::CourtCorners, homography::Homography};
    use nalgebra::Matrix3;

    fn fake_output(name: &str) -> PipelineOutput {
        let square = CourtCorners {
            top_left: (0., 0.),
            top_right: (1., 0.),
            bottom_right: (1., 1.),
            bottom_left: (0., 1.),
        };
        PipelineOutput {
            artifact_path: PathBuf::from(name),
            frames_processed: 1,
            records_written: 1,
            detections_skipped: 0,
            corners: square,
            homography: Homography::from_matrix(Matrix3::identity()),
        }
    }

    #[test]
    fn test_jobs_report_done_and_failed() {
        let queue = JobQueue::new(2);
        let ok = queue.submit(|| Ok(fake_output("a.csv")));
        let failed = queue.submit(|| {
            Err(PipelineError::InsufficientLines {
                total: 1,
                horizontal: 1,
                vertical: 0,
            })
        });
        let panicked = queue.submit(|| panic!("boom"));

        let statuses = queue.join();
        assert_eq!(
            statuses.get(&ok),
            Some(&JobStatus::Done {
                artifact: PathBuf::from("a.csv"),
                records_written: 1
            })
        );
        match statuses.get(&failed) {
            Some(JobStatus::Failed { error }) => assert!(error.contains("insufficient court lines")),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(
            statuses.get(&panicked),
            Some(&JobStatus::Failed {
                error: String::from("job panicked")
            })
        );
        assert_eq!(statuses.keys().copied().collect::<Vec<_>>(), vec![ok, failed, panicked]);
    }

    #[test]
    fn test_pending_until_worker_free() {
        let queue = JobQueue::new(1);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let first = queue.submit(move || {
            release_rx.recv().ok();
            Ok(fake_output("first.csv"))
        });
        let second = queue.submit(|| Ok(fake_output("second.csv")));

        // The single worker is blocked on the first job
        assert_eq!(queue.status(second), Some(JobStatus::Pending));
        assert!(!queue.status(first).unwrap().is_finished());

        release_tx.send(()).unwrap();
        let statuses = queue.join();
        assert!(statuses.values().all(|s| s.is_finished()));
        assert_eq!(queue_status_json(&statuses[&second]), r#"{"status":"done","artifact":"second.csv","recordsWritten":1}"#);
    }

    fn queue_status_json(status: &JobStatus) -> String {
        serde_json::to_string(status).unwrap()
    }

    #[test]
    fn test_unknown_job() {
        let queue = JobQueue::new(1);
        assert_eq!(queue.status(42), None);
    }
}
