//! Single-writer queue in front of a key-value store.
//!
//! Writes are handed to one background thread and applied strictly in the
//! order they were enqueued, so the last enqueued value is the one left in
//! storage. Callers never wait for a write and never see its failure; failed
//! writes are logged and dropped.

use crate::error::AppError;
use crate::storage::KeyValueStore;
use log::{debug, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

enum Job {
    Write { key: String, value: String },
    Barrier(Sender<()>),
}

pub struct WriteQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl WriteQueue {
    pub fn spawn<S: KeyValueStore>(store: S) -> Result<Self, AppError> {
        let (sender, receiver) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("tasklist-writer".to_string())
            .spawn(move || run_worker(store, receiver))
            .map_err(|err| AppError::io(format!("failed to start writer thread: {err}")))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn enqueue(&self, key: &str, value: String) {
        let job = Job::Write {
            key: key.to_string(),
            value,
        };
        let sent = self
            .sender
            .as_ref()
            .map(|sender| sender.send(job).is_ok())
            .unwrap_or(false);
        if !sent {
            warn!("event=state_save module=storage status=dropped key={key} reason=writer_stopped");
        }
    }

    /// Blocks until every write enqueued before this call has been attempted.
    pub fn flush(&self) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };

        let (ack, done) = mpsc::channel();
        if sender.send(Job::Barrier(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is left and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("event=writer_stop module=storage status=panicked");
        }
    }
}

fn run_worker<S: KeyValueStore>(store: S, receiver: Receiver<Job>) {
    for job in receiver {
        match job {
            Job::Write { key, value } => match store.set(&key, &value) {
                Ok(()) => debug!(
                    "event=state_save module=storage status=ok key={} bytes={}",
                    key,
                    value.len()
                ),
                Err(err) => {
                    warn!("event=state_save module=storage status=failed key={key} error={err}")
                }
            },
            Job::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
