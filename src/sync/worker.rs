use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::NaiveDate;
use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::model::{DaySchedule, Inventory};

use super::client::{RemoteStore, SyncError};
use super::intent::RemoteIntent;

/// Work for the network thread
#[derive(Debug)]
pub enum SyncRequest {
    Send { seq: u64, intent: RemoteIntent },
    FetchDay(NaiveDate),
    FetchInventory,
    Shutdown,
}

/// Result reported back to the UI thread
#[derive(Debug)]
pub enum SyncReport {
    Sent { seq: u64 },
    Failed { seq: u64, error: SyncError },
    Day {
        date: NaiveDate,
        result: Result<DaySchedule, SyncError>,
    },
    Inventory(Result<Inventory, SyncError>),
}

/// Owns the thread that talks to the backend. Requests are handled one at a
/// time in the order they arrive.
pub struct SyncWorker {
    tx: Sender<SyncRequest>,
    rx: Receiver<SyncReport>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn spawn<S: RemoteStore + 'static>(store: S) -> Self {
        let (tx, requests) = unbounded::<SyncRequest>();
        let (reports, rx) = unbounded::<SyncReport>();

        let handle = thread::spawn(move || {
            for request in requests.iter() {
                let report = match request {
                    SyncRequest::Shutdown => break,
                    SyncRequest::Send { seq, intent } => {
                        debug!(seq, change = %intent.describe(), "sending");
                        match store.send(&intent) {
                            Ok(()) => SyncReport::Sent { seq },
                            Err(error) => {
                                warn!(seq, %error, "send failed");
                                SyncReport::Failed { seq, error }
                            }
                        }
                    }
                    SyncRequest::FetchDay(date) => SyncReport::Day {
                        date,
                        result: store.fetch_day(date),
                    },
                    SyncRequest::FetchInventory => SyncReport::Inventory(store.fetch_inventory()),
                };
                if reports.send(report).is_err() {
                    break;
                }
            }
        });

        SyncWorker {
            tx,
            rx,
            handle: Some(handle),
        }
    }

    /// Queue a request. False once the worker has stopped.
    pub fn request(&self, request: SyncRequest) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Non-blocking: every report received so far.
    pub fn poll(&self) -> Vec<SyncReport> {
        self.rx.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SyncReport> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(SyncRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
