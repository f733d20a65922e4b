//! Fixed-size, ordered store of timer records

use indexmap::IndexMap;

use super::{TimerPatch, TimerRecord};

/// Number of timers created at startup
pub const DEFAULT_TIMER_COUNT: usize = 8;

/// Full point-in-time copy of every timer, keyed by timer id in display order
pub type Snapshot = IndexMap<String, TimerRecord>;

/// Owns every timer record for the lifetime of the process.
///
/// The set of ids is fixed at construction; updates for ids outside it are
/// refused rather than creating new entries.
#[derive(Debug, Clone)]
pub struct TimerStore {
    timers: Snapshot,
}

impl TimerStore {
    /// Create `count` placeholder timers with ids `timer1..timerN`
    pub fn new(count: usize) -> Self {
        let timers = (0..count)
            .map(|index| (format!("timer{}", index + 1), TimerRecord::placeholder(index)))
            .collect();
        Self { timers }
    }

    /// Create the default set of timers
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TIMER_COUNT)
    }

    /// Build a store from explicit records, keeping their order
    pub fn from_records<I, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, TimerRecord)>,
        K: Into<String>,
    {
        Self {
            timers: records.into_iter().map(|(id, record)| (id.into(), record)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&TimerRecord> {
        self.timers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.timers.keys().map(String::as_str)
    }

    /// Merge `patch` into the record for `id` and return the result.
    ///
    /// Returns `None` without touching anything when `id` is unknown.
    pub fn apply_partial_update(&mut self, id: &str, patch: &TimerPatch) -> Option<TimerRecord> {
        let record = self.timers.get_mut(id)?;
        patch.apply_to(record);
        Some(record.clone())
    }

    /// Stop the timer for `id` if it was left running with nothing remaining
    pub fn settle(&mut self, id: &str) -> bool {
        self.timers.get_mut(id).is_some_and(TimerRecord::settle)
    }

    /// Advance every running timer by one second. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        for record in self.timers.values_mut() {
            changed |= record.advance();
        }
        changed
    }

    pub fn snapshot(&self) -> Snapshot {
        self.timers.clone()
    }
}

impl Default for TimerStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(remaining: u64) -> TimerPatch {
        TimerPatch {
            remaining: Some(remaining),
            is_running: Some(true),
            ..TimerPatch::default()
        }
    }

    fn single(total_duration: u64) -> TimerStore {
        TimerStore::from_records([("timer1", TimerRecord::new("Timer 1", "Task A", total_duration))])
    }

    #[test]
    fn default_store_has_eight_ordered_timers() {
        let store = TimerStore::with_defaults();
        let ids: Vec<&str> = store.ids().collect();
        assert_eq!(
            ids,
            ["timer1", "timer2", "timer3", "timer4", "timer5", "timer6", "timer7", "timer8"]
        );
        assert!(store.snapshot().values().all(|t| t.remaining == 600 && !t.is_running));
    }

    #[test]
    fn unknown_id_is_refused() {
        let mut store = TimerStore::with_defaults();
        assert!(store.apply_partial_update("timer99", &TimerPatch::start()).is_none());
        assert_eq!(store.len(), DEFAULT_TIMER_COUNT);
        assert!(!store.contains("timer99"));
    }

    #[test]
    fn partial_update_touches_only_given_fields() {
        let mut store = TimerStore::with_defaults();
        let before = store.get("timer2").cloned().unwrap();
        let patch = TimerPatch {
            task: Some("X".to_string()),
            ..TimerPatch::default()
        };

        let after = store.apply_partial_update("timer2", &patch).unwrap();
        assert_eq!(after.task, "X");
        assert_eq!(after.name, before.name);
        assert_eq!(after.remaining, before.remaining);
        assert_eq!(after.total_duration, before.total_duration);
        assert_eq!(after.is_running, before.is_running);
    }

    #[test]
    fn idle_tick_reports_no_change() {
        let mut store = TimerStore::with_defaults();
        assert!(!store.tick());
    }

    #[test]
    fn running_invariant_holds_after_every_tick() {
        let mut store = TimerStore::with_defaults();
        store.apply_partial_update("timer1", &running(2));
        store.apply_partial_update("timer2", &running(0));
        store.apply_partial_update("timer3", &TimerPatch::start());

        for _ in 0..5 {
            store.tick();
            assert!(store.snapshot().values().all(|t| !t.is_running || t.remaining > 0));
        }
    }

    #[test]
    fn last_second_completes_and_stays_completed() {
        let mut store = single(600);
        store.apply_partial_update("timer1", &running(1));

        assert!(store.tick());
        let timer = store.get("timer1").unwrap();
        assert_eq!((timer.remaining, timer.is_running), (0, false));

        for _ in 0..3 {
            assert!(!store.tick());
        }
        assert_eq!(store.get("timer1").unwrap().remaining, 0);
    }

    #[test]
    fn three_second_timer_runs_out_after_three_ticks() {
        let mut store = single(3);
        store.apply_partial_update("timer1", &TimerPatch::start());

        for _ in 0..3 {
            assert!(store.tick());
        }
        let timer = store.get("timer1").unwrap();
        assert_eq!((timer.remaining, timer.is_running), (0, false));
    }

    #[test]
    fn set_then_start_then_tick() {
        let mut store = TimerStore::with_defaults();
        store.apply_partial_update("timer4", &TimerPatch::set(300));
        store.apply_partial_update("timer4", &TimerPatch::start());
        store.tick();

        let timer = store.get("timer4").unwrap();
        assert_eq!((timer.remaining, timer.is_running), (299, true));
        assert_eq!(timer.total_duration, 300);
    }

    #[test]
    fn settle_stops_depleted_timer() {
        let mut store = single(0);
        store.apply_partial_update("timer1", &TimerPatch::start());
        assert!(store.settle("timer1"));
        assert!(!store.get("timer1").unwrap().is_running);
        assert!(!store.settle("timer1"));
        assert!(!store.settle("missing"));
    }
}
