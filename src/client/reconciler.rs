//! Client-side mirror of the server's timers

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::debug;

use super::flash::{ThresholdAlert, DEFAULT_THRESHOLDS};
use crate::{
    protocol::TimerCommand,
    state::{Snapshot, TimerPatch, TimerRecord},
};

/// In-progress edit of a timer's labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDraft {
    pub name: String,
    pub task: String,
    pub queue: Option<String>,
}

impl MetadataDraft {
    fn from_record(record: &TimerRecord) -> Self {
        Self {
            name: record.name.clone(),
            task: record.task.clone(),
            queue: record.queue.clone(),
        }
    }
}

/// How a timer should currently be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visual {
    Normal,
    Flash,
    Alert,
}

/// Local view of one timer
#[derive(Debug, Clone)]
pub struct LocalTimer {
    pub record: TimerRecord,
    /// Open metadata editor, if any
    pub editor: Option<MetadataDraft>,
    alerts: Vec<ThresholdAlert>,
}

impl LocalTimer {
    fn new(record: TimerRecord, thresholds: &[u64], now: Instant) -> Self {
        let mut timer = Self {
            record,
            editor: None,
            alerts: thresholds.iter().copied().map(ThresholdAlert::new).collect(),
        };
        timer.observe_thresholds(now);
        timer
    }

    fn observe_thresholds(&mut self, now: Instant) {
        let remaining = self.record.remaining;
        for alert in &mut self.alerts {
            if alert.observe(remaining, now) {
                debug!(threshold = alert.threshold(), remaining, "Threshold crossed, flashing");
            }
        }
    }

    pub fn alerts(&self) -> &[ThresholdAlert] {
        &self.alerts
    }

    /// Alerts whose threshold covers the current remaining time
    fn active_alerts(&self) -> impl Iterator<Item = &ThresholdAlert> {
        let remaining = self.record.remaining;
        self.alerts.iter().filter(move |a| a.applies_to(remaining))
    }

    pub fn visual(&self) -> Visual {
        if self.active_alerts().any(|a| a.sequence().is_lit()) {
            Visual::Flash
        } else if self.active_alerts().any(|a| a.sequence().is_settled()) {
            Visual::Alert
        } else {
            Visual::Normal
        }
    }
}

/// Mirrors the server's snapshots for one connected client.
///
/// Snapshots replace local state wholesale, except that labels of a timer
/// whose editor is open are left alone. User actions update the mirror
/// optimistically and yield the command to send; the next snapshot confirms
/// or corrects them. Flash sequences are purely local and survive both
/// snapshots and reconnects.
#[derive(Debug, Clone)]
pub struct Reconciler {
    timers: IndexMap<String, LocalTimer>,
    thresholds: Vec<u64>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(&DEFAULT_THRESHOLDS)
    }
}

impl Reconciler {
    pub fn new(thresholds: &[u64]) -> Self {
        Self {
            timers: IndexMap::new(),
            thresholds: thresholds.to_vec(),
        }
    }

    pub fn timers(&self) -> impl Iterator<Item = (&str, &LocalTimer)> {
        self.timers.iter().map(|(id, timer)| (id.as_str(), timer))
    }

    pub fn timer(&self, id: &str) -> Option<&LocalTimer> {
        self.timers.get(id)
    }

    /// Replace local state with an authoritative snapshot
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let now = Instant::now();
        let mut previous = std::mem::take(&mut self.timers);

        for (id, incoming) in snapshot {
            let timer = match previous.swap_remove(id) {
                Some(mut timer) => {
                    let mut record = incoming.clone();
                    if timer.editor.is_some() {
                        record.name = std::mem::take(&mut timer.record.name);
                        record.task = std::mem::take(&mut timer.record.task);
                        record.queue = timer.record.queue.take();
                    }
                    timer.record = record;
                    timer.observe_thresholds(now);
                    timer
                }
                None => LocalTimer::new(incoming.clone(), &self.thresholds, now),
            };
            self.timers.insert(id.clone(), timer);
        }
    }

    /// Start a timer that has time left
    pub fn start(&mut self, id: &str) -> Option<TimerCommand> {
        let timer = self.timers.get_mut(id)?;
        if timer.record.remaining == 0 {
            return None;
        }
        timer.record.is_running = true;
        Some(TimerCommand::new(id, TimerPatch::start()))
    }

    pub fn pause(&mut self, id: &str) -> Option<TimerCommand> {
        let timer = self.timers.get_mut(id)?;
        timer.record.is_running = false;
        Some(TimerCommand::new(id, TimerPatch::pause()))
    }

    /// Reset a timer to `minutes:seconds`, stopped, re-arming thresholds below it
    pub fn set(&mut self, id: &str, minutes: u64, seconds: u64) -> Option<TimerCommand> {
        let timer = self.timers.get_mut(id)?;
        let total = minutes.saturating_mul(60).saturating_add(seconds);

        timer.record.total_duration = total;
        timer.record.remaining = total;
        timer.record.is_running = false;
        for alert in &mut timer.alerts {
            alert.rearm(total);
        }
        timer.observe_thresholds(Instant::now());

        Some(TimerCommand::new(id, TimerPatch::set(total)))
    }

    /// Open the metadata editor, seeded with the current labels
    pub fn open_editor(&mut self, id: &str) -> bool {
        match self.timers.get_mut(id) {
            Some(timer) => {
                if timer.editor.is_none() {
                    timer.editor = Some(MetadataDraft::from_record(&timer.record));
                }
                true
            }
            None => false,
        }
    }

    pub fn draft_mut(&mut self, id: &str) -> Option<&mut MetadataDraft> {
        self.timers.get_mut(id)?.editor.as_mut()
    }

    /// Close the editor without saving
    pub fn cancel_editor(&mut self, id: &str) -> bool {
        self.timers
            .get_mut(id)
            .and_then(|timer| timer.editor.take())
            .is_some()
    }

    /// Commit the editor's draft and close it
    pub fn save_metadata(&mut self, id: &str) -> Option<TimerCommand> {
        let timer = self.timers.get_mut(id)?;
        let draft = timer.editor.take()?;

        timer.record.name = draft.name.clone();
        timer.record.task = draft.task.clone();
        if draft.queue.is_some() {
            timer.record.queue = draft.queue.clone();
        }

        Some(TimerCommand::new(
            id,
            TimerPatch::metadata(draft.name, draft.task, draft.queue),
        ))
    }

    /// Perform every flash toggle that is due at `now`.
    ///
    /// Returns true if any sequence changed.
    pub fn advance_flash(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for timer in self.timers.values_mut() {
            for alert in &mut timer.alerts {
                changed |= alert.step_due(now);
            }
        }
        changed
    }

    /// Earliest pending flash toggle across all timers
    pub fn next_flash(&self) -> Option<Instant> {
        self.timers
            .values()
            .flat_map(|timer| timer.alerts.iter())
            .filter_map(ThresholdAlert::next_toggle)
            .min()
    }

    pub fn visual(&self, id: &str) -> Option<Visual> {
        self.timers.get(id).map(LocalTimer::visual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{
        client::flash::{FlashSequence, FLASH_INTERVAL, FLASH_TOGGLES},
        state::TimerStore,
    };

    fn snapshot_with(id: &str, update: impl FnOnce(&mut TimerRecord)) -> Snapshot {
        let mut snapshot = TimerStore::with_defaults().snapshot();
        if let Some(record) = snapshot.get_mut(id) {
            update(record);
        }
        snapshot
    }

    fn reconciled() -> Reconciler {
        let mut reconciler = Reconciler::default();
        reconciler.apply_snapshot(&TimerStore::with_defaults().snapshot());
        reconciler
    }

    /// Perform the next due toggle of every running sequence
    fn step_flash(reconciler: &mut Reconciler) -> bool {
        match reconciler.next_flash() {
            Some(due) => reconciler.advance_flash(due),
            None => false,
        }
    }

    fn finish_flash(reconciler: &mut Reconciler) {
        while step_flash(reconciler) {}
    }

    #[test]
    fn snapshot_replaces_mirror_wholesale() {
        let mut reconciler = reconciled();
        assert_eq!(reconciler.timers().count(), 8);

        let snapshot = TimerStore::new(2).snapshot();
        reconciler.apply_snapshot(&snapshot);
        assert_eq!(reconciler.timers().count(), 2);
        assert!(reconciler.timer("timer3").is_none());
        assert_eq!(reconciler.timer("timer2").unwrap().record, snapshot["timer2"]);
    }

    #[test]
    fn start_requires_time_remaining() {
        let mut reconciler = reconciled();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 0));

        assert!(reconciler.start("timer1").is_none());
        assert!(!reconciler.timer("timer1").unwrap().record.is_running);

        let command = reconciler.start("timer2").unwrap();
        assert_eq!(command.timer_data, TimerPatch::start());
        assert!(reconciler.timer("timer2").unwrap().record.is_running);
    }

    #[test]
    fn set_computes_total_and_stops() {
        let mut reconciler = reconciled();
        reconciler.start("timer3");

        let command = reconciler.set("timer3", 5, 0).unwrap();
        assert_eq!(command.timer_id, "timer3");
        assert_eq!(command.timer_data, TimerPatch::set(300));

        let record = &reconciler.timer("timer3").unwrap().record;
        assert_eq!((record.total_duration, record.remaining, record.is_running), (300, 300, false));
    }

    #[test]
    fn open_editor_shields_labels_but_not_countdown() {
        let mut reconciler = reconciled();
        assert!(reconciler.open_editor("timer1"));
        reconciler.draft_mut("timer1").unwrap().task = "Draft task".to_string();

        reconciler.apply_snapshot(&snapshot_with("timer1", |t| {
            t.name = "Renamed elsewhere".to_string();
            t.task = "Other task".to_string();
            t.remaining = 500;
            t.is_running = true;
        }));

        let timer = reconciler.timer("timer1").unwrap();
        assert_eq!(timer.record.name, "Timer 1");
        assert_eq!(timer.record.task, "Task A");
        assert_eq!(timer.record.remaining, 500);
        assert!(timer.record.is_running);
        assert_eq!(timer.editor.as_ref().unwrap().task, "Draft task");

        // other timers still take the incoming labels
        reconciler.apply_snapshot(&snapshot_with("timer2", |t| t.task = "Fresh".to_string()));
        assert_eq!(reconciler.timer("timer2").unwrap().record.task, "Fresh");
    }

    #[test]
    fn save_sends_labels_and_closes_editor() {
        let mut reconciler = reconciled();
        reconciler.open_editor("timer4");
        {
            let draft = reconciler.draft_mut("timer4").unwrap();
            draft.name = "Grill".to_string();
            draft.queue = Some("Plate".to_string());
        }

        let command = reconciler.save_metadata("timer4").unwrap();
        assert_eq!(
            command.timer_data,
            TimerPatch::metadata("Grill".to_string(), "Task D".to_string(), Some("Plate".to_string()))
        );
        assert!(reconciler.timer("timer4").unwrap().editor.is_none());
        assert!(reconciler.save_metadata("timer4").is_none());

        // labels follow snapshots again once the editor is closed
        reconciler.apply_snapshot(&snapshot_with("timer4", |t| t.name = "Oven".to_string()));
        assert_eq!(reconciler.timer("timer4").unwrap().record.name, "Oven");
    }

    #[test]
    fn crossing_threshold_flashes_then_alerts() {
        let mut reconciler = reconciled();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| {
            t.remaining = 300;
            t.is_running = true;
        }));

        assert_eq!(reconciler.visual("timer1"), Some(Visual::Flash));
        assert!(reconciler.next_flash().is_some());

        finish_flash(&mut reconciler);
        assert_eq!(reconciler.visual("timer1"), Some(Visual::Alert));
        assert!(reconciler.next_flash().is_none());
        assert_eq!(reconciler.visual("timer2"), Some(Visual::Normal));
    }

    #[test]
    fn snapshots_during_flash_do_not_restart_it() {
        let mut reconciler = reconciled();
        for remaining in [240, 239, 238] {
            reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = remaining));
            step_flash(&mut reconciler);
        }

        let alerts = reconciler.timer("timer1").unwrap().alerts();
        // both thresholds fired on the first snapshot and advanced together
        assert!(alerts
            .iter()
            .all(|a| a.sequence() == FlashSequence::Flashing { toggles: 4, lit: false }));
    }

    #[test]
    fn each_threshold_fires_once_per_pass() {
        let mut reconciler = reconciled();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 299));
        finish_flash(&mut reconciler);

        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 240));
        let alerts = reconciler.timer("timer1").unwrap().alerts();
        assert!(alerts[0].sequence().is_settled());
        assert!(alerts[1].sequence().is_flashing());
        finish_flash(&mut reconciler);

        // a bounce above 240 within the same pass does not re-trigger
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 250));
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 239));
        assert!(reconciler.next_flash().is_none());
    }

    #[test]
    fn set_above_threshold_rearms_latch() {
        let mut reconciler = reconciled();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 100));
        finish_flash(&mut reconciler);

        // 4:00 is not above either threshold
        reconciler.set("timer1", 4, 0);
        assert!(reconciler.next_flash().is_none());

        reconciler.set("timer1", 4, 30);
        let alerts = reconciler.timer("timer1").unwrap().alerts();
        assert!(alerts[0].sequence().is_settled());
        assert_eq!(alerts[1].sequence(), FlashSequence::Inactive);

        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 240));
        assert_eq!(reconciler.visual("timer1"), Some(Visual::Flash));
    }

    #[test]
    fn unknown_timer_actions_are_ignored() {
        let mut reconciler = reconciled();
        assert!(reconciler.start("nope").is_none());
        assert!(reconciler.pause("nope").is_none());
        assert!(reconciler.set("nope", 1, 0).is_none());
        assert!(!reconciler.open_editor("nope"));
        assert!(reconciler.visual("nope").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn first_toggle_comes_one_interval_after_crossing() {
        let mut reconciler = reconciled();
        tokio::time::advance(Duration::from_millis(1400)).await;

        let crossed = Instant::now();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 300));
        assert_eq!(reconciler.visual("timer1"), Some(Visual::Flash));
        assert_eq!(reconciler.next_flash(), Some(crossed + FLASH_INTERVAL));

        tokio::time::advance(FLASH_INTERVAL - Duration::from_millis(1)).await;
        assert!(!reconciler.advance_flash(Instant::now()));
        assert_eq!(reconciler.visual("timer1"), Some(Visual::Flash));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(reconciler.advance_flash(Instant::now()));
        assert_eq!(reconciler.visual("timer1"), Some(Visual::Normal));
    }

    #[tokio::test(start_paused = true)]
    async fn thresholds_crossed_apart_keep_separate_phases() {
        let mut reconciler = reconciled();
        let first = Instant::now();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 300));

        tokio::time::advance(Duration::from_millis(300)).await;
        let second = Instant::now();
        reconciler.apply_snapshot(&snapshot_with("timer1", |t| t.remaining = 240));

        let alerts = reconciler.timer("timer1").unwrap().alerts();
        assert_eq!(alerts[0].next_toggle(), Some(first + FLASH_INTERVAL));
        assert_eq!(alerts[1].next_toggle(), Some(second + FLASH_INTERVAL));

        // only the earlier sequence is due at its own deadline
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(reconciler.advance_flash(Instant::now()));
        let alerts = reconciler.timer("timer1").unwrap().alerts();
        assert_eq!(alerts[0].sequence(), FlashSequence::Flashing { toggles: 2, lit: false });
        assert_eq!(alerts[1].sequence(), FlashSequence::Flashing { toggles: 1, lit: true });
    }

    #[test]
    fn sequence_runs_the_full_toggle_count() {
        let mut reconciler = reconciled();
        reconciler.apply_snapshot(&snapshot_with("timer2", |t| t.remaining = 299));

        let mut steps = 0;
        while step_flash(&mut reconciler) {
            steps += 1;
        }
        // nine more toggles after the first, then one step to settle
        assert_eq!(steps, usize::from(FLASH_TOGGLES));
        assert_eq!(reconciler.visual("timer2"), Some(Visual::Alert));
    }
}
