use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{Inventory, SyncConfig};

use super::client::SyncError;
use super::intent::{Change, RemoteIntent, Rollback};

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for RetryPolicy {
    fn from(config: &SyncConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// One queued change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub intent: RemoteIntent,
    pub rollback: Rollback,
    /// Failed attempts so far
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip)]
    not_before: Option<Instant>,
}

/// What happened to a failed head entry
#[derive(Debug, PartialEq)]
pub enum FailOutcome {
    /// Kept at the head; try again after `delay`
    Retry { attempt: u32, delay: Duration },
    /// Given up; the local change must be rolled back
    Abandoned(Abandoned),
    /// Sync is not configured; the entry stays queued untouched
    Deferred,
}

/// A terminally failed entry plus the later entries for the same block
/// that were dropped with it
#[derive(Debug, Clone, PartialEq)]
pub struct Abandoned {
    pub entry: JournalEntry,
    pub dropped: Vec<JournalEntry>,
    pub reason: String,
}

impl Abandoned {
    /// Rollbacks newest first, ending with the failed entry's snapshot
    pub fn rollbacks(&self) -> impl Iterator<Item = &Rollback> {
        self.dropped
            .iter()
            .rev()
            .map(|e| &e.rollback)
            .chain(std::iter::once(&self.entry.rollback))
    }
}

/// Durable queue of local changes awaiting the backend. Only the head entry
/// is ever in flight, so requests reach the server in the order they were
/// made.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outbox {
    #[serde(default)]
    next_seq: u64,
    #[serde(default)]
    entries: VecDeque<JournalEntry>,
    #[serde(skip)]
    in_flight: Option<u64>,
    #[serde(skip)]
    policy: RetryPolicy,
}

impl Outbox {
    pub fn new(policy: RetryPolicy) -> Self {
        Outbox {
            policy,
            ..Default::default()
        }
    }

    pub fn set_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// True when some queued change still targets `date`. Server data for
    /// that day would be stale until the queue drains.
    pub fn has_pending_for(&self, date: NaiveDate) -> bool {
        self.entries.iter().any(|e| e.intent.date() == date)
    }

    /// Apply the assignment flags of queued changes over a fetched
    /// inventory, oldest first, so the backend's copy cannot undo them.
    pub fn overlay_inventory(&self, inventory: &mut Inventory) {
        for flag in self.entries.iter().flat_map(|e| e.intent.inventory_flags()) {
            inventory.set_assigned(flag.source, &flag.task_id, flag.assigned);
        }
    }

    /// Queue a change; returns its sequence number.
    pub fn push(&mut self, change: Change) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.entries.push_back(JournalEntry {
            seq,
            intent: change.intent,
            rollback: change.rollback,
            attempts: 0,
            last_error: None,
            not_before: None,
        });
        seq
    }

    /// Time until the head entry may be sent, None when nothing is waiting.
    pub fn head_wait(&self, now: Instant) -> Option<Duration> {
        if self.in_flight.is_some() {
            return None;
        }
        let head = self.entries.front()?;
        Some(
            head.not_before
                .map_or(Duration::ZERO, |t| t.saturating_duration_since(now)),
        )
    }

    /// Claim the head entry for sending if nothing is in flight and its
    /// backoff has elapsed.
    pub fn next_ready(&mut self, now: Instant) -> Option<(u64, RemoteIntent)> {
        if self.head_wait(now)? > Duration::ZERO {
            return None;
        }
        let head = self.entries.front()?;
        self.in_flight = Some(head.seq);
        Some((head.seq, head.intent.clone()))
    }

    /// The backend accepted entry `seq`.
    pub fn ack(&mut self, seq: u64) {
        if self.entries.front().is_some_and(|e| e.seq == seq) {
            self.entries.pop_front();
        }
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
    }

    /// Record a failure of entry `seq`, deciding between retry and rollback.
    pub fn fail(&mut self, seq: u64, error: &SyncError, now: Instant) -> FailOutcome {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
        let Some(head) = self.entries.front_mut() else {
            return FailOutcome::Deferred;
        };
        if head.seq != seq || matches!(error, SyncError::NotReady(_)) {
            return FailOutcome::Deferred;
        }

        head.attempts += 1;
        head.last_error = Some(error.to_string());
        if error.is_retryable() && head.attempts < self.policy.max_attempts {
            let delay = self.policy.delay_for(head.attempts);
            head.not_before = Some(now + delay);
            info!(seq, attempt = head.attempts, ?delay, %error, "sync retry scheduled");
            return FailOutcome::Retry {
                attempt: head.attempts,
                delay,
            };
        }

        let Some(entry) = self.entries.pop_front() else {
            return FailOutcome::Deferred;
        };
        let (date, block_id) = (entry.intent.date(), entry.intent.block_id().to_string());
        let (dropped, kept): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|e| e.intent.date() == date && e.intent.block_id() == block_id);
        self.entries = kept.into();
        warn!(
            seq,
            change = %entry.intent.describe(),
            dropped = dropped.len(),
            %error,
            "sync abandoned, rolling back"
        );
        FailOutcome::Abandoned(Abandoned {
            entry,
            dropped,
            reason: error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Block, BlockType, ClockTime, InventorySource, InventoryTask, Task, TaskOrigin,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn change(block_id: &str) -> Change {
        let block = Block::new(block_id.into(), BlockType::Admin, ClockTime::new(9, 0).unwrap(), 30);
        Change {
            intent: RemoteIntent::UpdateBlock {
                date: date(),
                block: block.clone(),
            },
            rollback: Rollback {
                date: date(),
                block_id: block_id.into(),
                before: Some(block),
                index: 0,
                inventory: vec![],
            },
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 250,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = policy();
        assert_eq!(p.delay_for(1), Duration::from_millis(100));
        assert_eq!(p.delay_for(2), Duration::from_millis(200));
        assert_eq!(p.delay_for(3), Duration::from_millis(250));
        assert_eq!(p.delay_for(60), Duration::from_millis(250));
    }

    #[test]
    fn only_head_is_in_flight() {
        let mut outbox = Outbox::new(policy());
        let now = Instant::now();
        let a = outbox.push(change("b1"));
        let b = outbox.push(change("b2"));
        assert_eq!(outbox.next_ready(now).map(|(s, _)| s), Some(a));
        assert!(outbox.next_ready(now).is_none());
        outbox.ack(a);
        assert_eq!(outbox.next_ready(now).map(|(s, _)| s), Some(b));
        outbox.ack(b);
        assert!(outbox.is_empty());
    }

    #[test]
    fn retryable_failure_backs_off() {
        let mut outbox = Outbox::new(policy());
        let now = Instant::now();
        let seq = outbox.push(change("b1"));
        outbox.next_ready(now);
        let outcome = outbox.fail(seq, &SyncError::Network("reset".into()), now);
        assert_eq!(
            outcome,
            FailOutcome::Retry {
                attempt: 1,
                delay: Duration::from_millis(100)
            }
        );
        assert!(outbox.next_ready(now).is_none());
        assert_eq!(outbox.head_wait(now), Some(Duration::from_millis(100)));
        let later = now + Duration::from_millis(100);
        assert_eq!(outbox.next_ready(later).map(|(s, _)| s), Some(seq));
    }

    #[test]
    fn retries_exhaust_into_abandon() {
        let mut outbox = Outbox::new(policy());
        let mut now = Instant::now();
        let seq = outbox.push(change("b1"));
        let err = SyncError::Status {
            code: 503,
            message: "down".into(),
        };
        for _ in 0..2 {
            outbox.next_ready(now).unwrap();
            assert!(matches!(outbox.fail(seq, &err, now), FailOutcome::Retry { .. }));
            now += Duration::from_secs(1);
        }
        outbox.next_ready(now).unwrap();
        assert!(matches!(outbox.fail(seq, &err, now), FailOutcome::Abandoned(_)));
        assert!(outbox.is_empty());
    }

    #[test]
    fn terminal_failure_drops_same_block_entries() {
        let mut outbox = Outbox::new(policy());
        let now = Instant::now();
        let first = outbox.push(change("b1"));
        outbox.push(change("b2"));
        let third = outbox.push(change("b1"));
        outbox.next_ready(now);

        let FailOutcome::Abandoned(abandoned) =
            outbox.fail(first, &SyncError::Validation("bad".into()), now)
        else {
            panic!("expected abandon");
        };
        assert_eq!(abandoned.entry.seq, first);
        assert_eq!(abandoned.dropped.len(), 1);
        assert_eq!(abandoned.dropped[0].seq, third);
        assert_eq!(abandoned.rollbacks().count(), 2);
        let remaining: Vec<&str> = outbox.entries().map(|e| e.intent.block_id()).collect();
        assert_eq!(remaining, vec!["b2"]);
    }

    #[test]
    fn not_ready_leaves_entry_alone() {
        let mut outbox = Outbox::new(policy());
        let now = Instant::now();
        let seq = outbox.push(change("b1"));
        outbox.next_ready(now);
        let outcome = outbox.fail(seq, &SyncError::NotReady("no user".into()), now);
        assert_eq!(outcome, FailOutcome::Deferred);
        assert_eq!(outbox.entries().next().unwrap().attempts, 0);
        assert!(outbox.next_ready(now).is_some());
    }

    #[test]
    fn pending_dates() {
        let mut outbox = Outbox::default();
        outbox.push(change("b1"));
        assert!(outbox.has_pending_for(date()));
        assert!(!outbox.has_pending_for(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()));
    }

    #[test]
    fn queued_assignments_survive_a_fetched_inventory() {
        let origin = |id: &str| TaskOrigin {
            source: InventorySource::Backlog,
            task_id: id.into(),
        };
        let mut picked = Task::new("t1".into(), "Passport".into(), 20);
        picked.origin = Some(origin("bl-1"));
        let mut outbox = Outbox::default();
        let mut insert = change("b1");
        insert.intent = RemoteIntent::InsertTasks {
            date: date(),
            block_id: "b1".into(),
            index: 0,
            tasks: vec![picked],
        };
        outbox.push(insert);
        let mut unassign = change("b1");
        unassign.intent = RemoteIntent::UnassignTask {
            date: date(),
            block_id: "b1".into(),
            task_id: "t9".into(),
            origin: origin("bl-2"),
        };
        outbox.push(unassign);

        let task = |id: &str, assigned: bool| InventoryTask {
            id: id.into(),
            title: id.into(),
            duration_min: 10,
            project_id: None,
            assigned,
        };
        let mut fetched = Inventory {
            backlog: vec![task("bl-1", false), task("bl-2", true), task("bl-3", false)],
            ..Default::default()
        };
        outbox.overlay_inventory(&mut fetched);
        let flags: Vec<bool> = fetched.backlog.iter().map(|t| t.assigned).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn journal_survives_serialization() {
        let mut outbox = Outbox::new(policy());
        outbox.push(change("b1"));
        outbox.push(change("b2"));
        outbox.next_ready(Instant::now());
        let json = serde_json::to_string(&outbox).unwrap();
        let mut back: Outbox = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.in_flight(), None);
        assert_eq!(back.push(change("b3")), 3);
    }
}
