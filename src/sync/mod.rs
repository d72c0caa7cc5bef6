//! Mirroring local changes to the planner API.
//!
//! Every edit is applied locally first and queued in the [`outbox::Outbox`].
//! The TUI feeds the queue to a [`worker::SyncWorker`] thread one entry at a
//! time; the CLI drains it synchronously with [`drain`].

pub mod client;
pub mod intent;
pub mod outbox;
pub mod worker;

use std::thread;
use std::time::Instant;

use client::RemoteStore;
use outbox::{Abandoned, FailOutcome, Outbox};

/// Counts from one [`drain`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub sent: usize,
    pub retries: usize,
    /// Entries rolled back, including dropped followers
    pub abandoned: usize,
    pub remaining: usize,
    /// Stopped early because the backend is not usable yet
    pub deferred: bool,
}

/// Send queued entries in order until the queue is empty or sending is
/// deferred, sleeping through retry backoff. `on_abandoned` sees each
/// terminal failure so the caller can roll the change back.
pub fn drain(
    outbox: &mut Outbox,
    store: &dyn RemoteStore,
    mut on_abandoned: impl FnMut(&Abandoned),
) -> DrainSummary {
    let mut summary = DrainSummary::default();
    loop {
        let now = Instant::now();
        let Some(wait) = outbox.head_wait(now) else {
            break;
        };
        if !wait.is_zero() {
            thread::sleep(wait);
            continue;
        }
        let Some((seq, intent)) = outbox.next_ready(now) else {
            break;
        };
        match store.send(&intent) {
            Ok(()) => {
                outbox.ack(seq);
                summary.sent += 1;
            }
            Err(error) => match outbox.fail(seq, &error, Instant::now()) {
                FailOutcome::Retry { .. } => summary.retries += 1,
                FailOutcome::Abandoned(abandoned) => {
                    summary.abandoned += 1 + abandoned.dropped.len();
                    on_abandoned(&abandoned);
                }
                FailOutcome::Deferred => {
                    summary.deferred = true;
                    break;
                }
            },
        }
    }
    summary.remaining = outbox.len();
    summary
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use super::client::{RemoteStore, SyncError};
    use super::intent::RemoteIntent;
    use crate::model::{DaySchedule, Inventory};

    #[derive(Default)]
    struct Inner {
        failures: VecDeque<SyncError>,
        sent: Vec<RemoteIntent>,
        days: HashMap<NaiveDate, DaySchedule>,
        inventory: Inventory,
    }

    /// In-memory backend with scripted send failures
    #[derive(Clone, Default)]
    pub struct FakeStore {
        inner: Arc<Mutex<Inner>>,
    }

    impl FakeStore {
        pub fn fail_next(&self, error: SyncError) {
            self.inner.lock().unwrap().failures.push_back(error);
        }

        pub fn sent(&self) -> Vec<RemoteIntent> {
            self.inner.lock().unwrap().sent.clone()
        }

        pub fn put_day(&self, day: DaySchedule) {
            self.inner.lock().unwrap().days.insert(day.date, day);
        }

        pub fn put_inventory(&self, inventory: Inventory) {
            self.inner.lock().unwrap().inventory = inventory;
        }
    }

    impl RemoteStore for FakeStore {
        fn send(&self, intent: &RemoteIntent) -> Result<(), SyncError> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(error) = inner.failures.pop_front() {
                return Err(error);
            }
            inner.sent.push(intent.clone());
            Ok(())
        }

        fn fetch_day(&self, date: NaiveDate) -> Result<DaySchedule, SyncError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .days
                .get(&date)
                .cloned()
                .unwrap_or_else(|| DaySchedule::new(date)))
        }

        fn fetch_inventory(&self) -> Result<Inventory, SyncError> {
            Ok(self.inner.lock().unwrap().inventory.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::client::SyncError;
    use super::intent::{Change, RemoteIntent, Rollback};
    use super::outbox::RetryPolicy;
    use super::testing::FakeStore;
    use super::*;

    fn change(block_id: &str) -> Change {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        Change {
            intent: RemoteIntent::DeleteBlock {
                date,
                block_id: block_id.into(),
            },
            rollback: Rollback {
                date,
                block_id: block_id.into(),
                before: None,
                index: 0,
                inventory: vec![],
            },
        }
    }

    fn outbox() -> Outbox {
        Outbox::new(RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
        })
    }

    #[test]
    fn drain_sends_everything_in_order() {
        let store = FakeStore::default();
        let mut outbox = outbox();
        outbox.push(change("b1"));
        outbox.push(change("b2"));
        let summary = drain(&mut outbox, &store, |_| panic!("nothing should fail"));
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.remaining, 0);
        let ids: Vec<String> = store.sent().iter().map(|i| i.block_id().to_string()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }

    #[test]
    fn drain_retries_then_succeeds() {
        let store = FakeStore::default();
        store.fail_next(SyncError::Network("reset".into()));
        let mut outbox = outbox();
        outbox.push(change("b1"));
        let summary = drain(&mut outbox, &store, |_| {});
        assert_eq!(summary.retries, 1);
        assert_eq!(summary.sent, 1);
    }

    #[test]
    fn drain_reports_abandoned_and_continues() {
        let store = FakeStore::default();
        store.fail_next(SyncError::NotFound("b1".into()));
        let mut outbox = outbox();
        outbox.push(change("b1"));
        outbox.push(change("b1"));
        outbox.push(change("b2"));
        let mut rolled_back = Vec::new();
        let summary = drain(&mut outbox, &store, |a| rolled_back.push(a.entry.seq));
        assert_eq!(rolled_back, vec![1]);
        assert_eq!(summary.abandoned, 2);
        assert_eq!(summary.sent, 1);
    }

    #[test]
    fn drain_stops_when_not_ready() {
        let store = FakeStore::default();
        store.fail_next(SyncError::NotReady("no user".into()));
        let mut outbox = outbox();
        outbox.push(change("b1"));
        let summary = drain(&mut outbox, &store, |_| {});
        assert!(summary.deferred);
        assert_eq!(summary.remaining, 1);
    }
}
