//! Keyed, de-duplicated delayed actions.
//!
//! Each scheduled alarm gets its own sleeping tokio task. When the delay
//! elapses the task does nothing but post the alarm's `AlarmId` back to the
//! owner's queue; the owner then calls [`AlarmRegistry::take_fired`], which
//! only yields the payload if that exact alarm is still registered. This is
//! the liveness check that makes `cancel` effective immediately: once
//! `cancel` returns, any fire already in flight resolves to nothing.

use crate::common::AlarmId;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A pending alarm and the payload to replay when it fires.
struct PendingAlarm<T> {
    key: String,
    payload: T,
    timer: JoinHandle<()>,
}

/// Owns every pending alarm, at most one per key.
///
/// The registry is not shared; it lives inside the single worker context
/// and is mutated only from there.
pub struct AlarmRegistry<T> {
    alarms: SlotMap<AlarmId, PendingAlarm<T>>,
    by_key: HashMap<String, AlarmId>,
    fired_sender: mpsc::UnboundedSender<AlarmId>,
}

impl<T> AlarmRegistry<T> {
    /// Creates a registry that reports elapsed alarms on `fired_sender`.
    pub fn new(fired_sender: mpsc::UnboundedSender<AlarmId>) -> Self {
        Self {
            alarms: SlotMap::with_key(),
            by_key: HashMap::new(),
            fired_sender,
        }
    }

    /// Schedules `payload` to fire after `delay`, replacing any alarm already
    /// pending under `key`.
    ///
    /// A zero delay fires at the next scheduling opportunity. Must be called
    /// from within a tokio runtime.
    pub fn schedule(&mut self, key: impl Into<String>, delay: Duration, payload: T) -> AlarmId {
        let key = key.into();
        if self.cancel(&key) {
            debug!(%key, "Replaced pending alarm.");
        }

        let sender = self.fired_sender.clone();
        let id = self.alarms.insert_with_key(|id| PendingAlarm {
            key: key.clone(),
            payload,
            timer: tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                sender.send(id).ok();
            }),
        });
        debug!(%key, delay_ms = delay.as_millis() as u64, "Alarm scheduled.");
        self.by_key.insert(key, id);
        id
    }

    /// Cancels the alarm pending under `key`.
    ///
    /// Returns `true` if one was pending. Cancelling an unknown or already
    /// cancelled key is a no-op.
    pub fn cancel(&mut self, key: &str) -> bool {
        let Some(id) = self.by_key.remove(key) else {
            return false;
        };
        if let Some(alarm) = self.alarms.remove(id) {
            alarm.timer.abort();
            debug!(%key, "Alarm cancelled.");
        }
        true
    }

    /// Cancels every pending alarm. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.alarms.len();
        for (_, alarm) in self.alarms.drain() {
            alarm.timer.abort();
        }
        self.by_key.clear();
        if cancelled > 0 {
            debug!(cancelled, "All alarms cancelled.");
        }
        cancelled
    }

    /// Resolves a fired `AlarmId`.
    ///
    /// The entry is removed before the payload is handed back, so an action
    /// that schedules itself again under the same key starts from a clean
    /// slate. Returns `None` for alarms that were cancelled or replaced after
    /// their timer elapsed.
    pub fn take_fired(&mut self, id: AlarmId) -> Option<(String, T)> {
        let Some(alarm) = self.alarms.remove(id) else {
            trace!(?id, "Ignoring fire for a stale alarm.");
            return None;
        };
        if self.by_key.get(&alarm.key) == Some(&id) {
            self.by_key.remove(&alarm.key);
        }
        Some((alarm.key, alarm.payload))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// The keys of every pending alarm, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }
}

impl<T> Drop for AlarmRegistry<T> {
    fn drop(&mut self) {
        for (_, alarm) in self.alarms.iter() {
            alarm.timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn registry() -> (AlarmRegistry<&'static str>, mpsc::UnboundedReceiver<AlarmId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AlarmRegistry::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (mut alarms, mut fired) = registry();
        let start = Instant::now();
        let id = alarms.schedule("t1", Duration::from_millis(5000), "payload");

        let got = fired.recv().await.unwrap();
        assert_eq!(got, id);
        assert!(start.elapsed() >= Duration::from_millis(5000));
        assert_eq!(alarms.take_fired(got), Some(("t1".to_string(), "payload")));
        assert!(alarms.is_empty());
        assert!(!alarms.contains("t1"));

        // A second resolution of the same id yields nothing.
        assert_eq!(alarms.take_fired(got), None);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_a_key_keeps_only_the_latest() {
        let (mut alarms, mut fired) = registry();
        let start = Instant::now();
        alarms.schedule("k", Duration::from_millis(1000), "first");
        tokio::time::sleep(Duration::from_millis(200)).await;
        alarms.schedule("k", Duration::from_millis(3000), "second");
        assert_eq!(alarms.len(), 1);

        let id = fired.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(3200));
        assert_eq!(alarms.take_fired(id), Some(("k".to_string(), "second")));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (mut alarms, mut fired) = registry();
        alarms.schedule("t1", Duration::from_millis(5000), "payload");

        assert!(alarms.cancel("t1"));
        assert!(!alarms.cancel("t1"));
        assert!(!alarms.cancel("never-scheduled"));
        assert!(alarms.is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_timer_elapsed_suppresses_the_fire() {
        let (mut alarms, mut fired) = registry();
        let id = alarms.schedule("t1", Duration::ZERO, "payload");

        // The timer has already posted its id, but nobody resolved it yet.
        let got = fired.recv().await.unwrap();
        assert_eq!(got, id);
        assert!(alarms.cancel("t1"));
        assert_eq!(alarms.take_fired(got), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_fire_does_not_touch_replacement() {
        let (mut alarms, mut fired) = registry();
        let old = alarms.schedule("k", Duration::ZERO, "old");
        let stale = fired.recv().await.unwrap();
        assert_eq!(stale, old);

        let new = alarms.schedule("k", Duration::from_secs(60), "new");
        assert_eq!(alarms.take_fired(stale), None);
        assert!(alarms.contains("k"));

        assert_eq!(fired.recv().await.unwrap(), new);
        assert_eq!(alarms.take_fired(new), Some(("k".to_string(), "new")));
    }

    #[tokio::test(start_paused = true)]
    async fn action_can_reschedule_its_own_key() {
        let (mut alarms, mut fired) = registry();
        alarms.schedule("loop", Duration::from_secs(1), "tick");

        let id = fired.recv().await.unwrap();
        let (key, _) = alarms.take_fired(id).unwrap();
        assert!(!alarms.contains(&key));
        let next = alarms.schedule(key, Duration::from_secs(1), "tock");

        assert_eq!(fired.recv().await.unwrap(), next);
        assert_eq!(alarms.take_fired(next), Some(("loop".to_string(), "tock")));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_clears_every_key() {
        let (mut alarms, mut fired) = registry();
        alarms.schedule("a", Duration::from_secs(1), "a");
        alarms.schedule("b", Duration::from_secs(2), "b");
        let mut keys: Vec<&str> = alarms.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["a", "b"]);

        assert_eq!(alarms.cancel_all(), 2);
        assert_eq!(alarms.cancel_all(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn supports_long_delays() {
        let (mut alarms, mut fired) = registry();
        let start = Instant::now();
        alarms.schedule("long", Duration::from_secs(45 * 60), "later");

        let id = fired.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(45 * 60));
        assert!(alarms.take_fired(id).is_some());
    }
}
