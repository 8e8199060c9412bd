//! Timer/scheduler engine.
//!
//! Drives the node's recurring work (snapshot broadcast, session sweep,
//! WiFi polling) from the elapsed time the control loop measures.  The
//! scheduler notifies a [`SchedulerDelegate`] when schedules fire; the
//! control loop implements the delegate to push events into the queue.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Control loop                             │
//! │                                                              │
//! │   elapsed_ms ──▶ Scheduler.tick() ──▶ SchedulerDelegate      │
//! │                                            │                 │
//! │                                            ▼                 │
//! │                                  push_event(SyncTick, ...)   │
//! │                                            │                 │
//! │                                            ▼                 │
//! │                                  NodeService.tick()          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Periodic schedules carry the overshoot of a late tick into the next
//! interval but never fire more than once per tick, so a stalled loop
//! (e.g. a slow temperature conversion) yields one catch-up fire rather
//! than a burst.

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Label handed to the delegate (e.g. "sync").
    pub label: &'static str,
    /// Type of schedule.
    pub kind: ScheduleKind,
    /// Whether this schedule is currently enabled.
    pub enabled: bool,
}

/// The type of schedule determines how and when it fires.
#[derive(Debug, Clone)]
pub enum ScheduleKind {
    /// Fire every `interval_ms` milliseconds.
    Periodic { interval_ms: u32 },
    /// Fire once after `delay_ms`, then auto-disable.
    OneShot { delay_ms: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Decoupled from the event system: when a schedule fires it invokes the
/// [`SchedulerDelegate`] callback rather than pushing events itself.
pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
    enabled: bool,
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    elapsed_ms: u64,
    fired: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
            enabled: true,
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    elapsed_ms: 0,
                    fired: false,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Remove a schedule by slot index.
    pub fn remove(&mut self, slot: usize) {
        if slot < MAX_SCHEDULES {
            if let Some(entry) = &self.schedules[slot] {
                info!("Scheduler: removed '{}' from slot {}", entry.schedule.label, slot);
            }
            self.schedules[slot] = None;
        }
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Advance every enabled schedule by `elapsed_ms`.
    ///
    /// When a schedule fires, `delegate.on_schedule_fired()` is called
    /// with the schedule label and fire kind.
    pub fn tick(&mut self, elapsed_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        if !self.enabled {
            return;
        }

        for slot in self.schedules.iter_mut() {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            entry.elapsed_ms += u64::from(elapsed_ms);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms } => {
                    let interval = u64::from(interval_ms.max(1));
                    if entry.elapsed_ms >= interval {
                        debug!("Scheduler: '{}' periodic fire", entry.schedule.label);
                        delegate.on_schedule_fired(
                            entry.schedule.label,
                            ScheduleFiredKind::Periodic,
                        );
                        // Keep the overshoot, drop whole missed intervals.
                        entry.elapsed_ms = (entry.elapsed_ms - interval) % interval;
                    }
                }

                ScheduleKind::OneShot { delay_ms } => {
                    if !entry.fired && entry.elapsed_ms >= u64::from(delay_ms) {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {} ms)",
                            entry.schedule.label, delay_ms
                        );
                        delegate.on_schedule_fired(
                            entry.schedule.label,
                            ScheduleFiredKind::OneShot,
                        );
                        entry.fired = true;
                        entry.schedule.enabled = false; // Auto-disable.
                    }
                }
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .filter(|s| s.as_ref().is_some_and(|e| e.schedule.enabled))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Test delegate that records fire events.
    struct RecordingDelegate {
        fires: Vec<(String, ScheduleFiredKind)>,
    }

    impl RecordingDelegate {
        fn new() -> Self {
            Self { fires: Vec::new() }
        }
    }

    impl SchedulerDelegate for RecordingDelegate {
        fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
            self.fires.push((label.to_string(), kind));
        }
    }

    fn periodic(label: &'static str, interval_ms: u32) -> Schedule {
        Schedule {
            label,
            kind: ScheduleKind::Periodic { interval_ms },
            enabled: true,
        }
    }

    #[test]
    fn periodic_fires_at_interval() {
        let mut sched = Scheduler::new();
        let mut delegate = RecordingDelegate::new();
        sched.add(periodic("sync", 100));

        // 9 × 10 ms — should NOT fire.
        for _ in 0..9 {
            sched.tick(10, &mut delegate);
        }
        assert!(delegate.fires.is_empty());

        // 10th tick — should fire.
        sched.tick(10, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);
        assert_eq!(delegate.fires[0].0, "sync");
        assert_eq!(delegate.fires[0].1, ScheduleFiredKind::Periodic);
    }

    #[test]
    fn overshoot_carries_into_next_interval() {
        let mut sched = Scheduler::new();
        let mut delegate = RecordingDelegate::new();
        sched.add(periodic("sync", 100));

        sched.tick(130, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);

        // 30 ms carried over, so 70 more fires again.
        sched.tick(70, &mut delegate);
        assert_eq!(delegate.fires.len(), 2);
    }

    #[test]
    fn stalled_loop_fires_once_not_a_burst() {
        let mut sched = Scheduler::new();
        let mut delegate = RecordingDelegate::new();
        sched.add(periodic("sync", 100));

        sched.tick(950, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);

        sched.tick(40, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);
        sched.tick(10, &mut delegate);
        assert_eq!(delegate.fires.len(), 2);
    }

    #[test]
    fn oneshot_fires_once() {
        let mut sched = Scheduler::new();
        let mut delegate = RecordingDelegate::new();

        sched.add(Schedule {
            label: "wifi",
            kind: ScheduleKind::OneShot { delay_ms: 500 },
            enabled: true,
        });

        for _ in 0..4 {
            sched.tick(100, &mut delegate);
        }
        assert!(delegate.fires.is_empty());

        sched.tick(100, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);
        assert_eq!(delegate.fires[0].1, ScheduleFiredKind::OneShot);
        assert_eq!(sched.active_count(), 0);

        for _ in 0..10 {
            sched.tick(100, &mut delegate);
        }
        assert_eq!(delegate.fires.len(), 1);
    }

    #[test]
    fn slots_are_bounded() {
        let mut sched = Scheduler::new();
        for _ in 0..MAX_SCHEDULES {
            assert!(sched.add(periodic("x", 10)).is_some());
        }
        assert!(sched.add(periodic("overflow", 10)).is_none());

        sched.remove(0);
        assert_eq!(sched.active_count(), MAX_SCHEDULES - 1);
        assert_eq!(sched.add(periodic("again", 10)), Some(0));
    }

    #[test]
    fn disabled_scheduler_does_nothing() {
        let mut sched = Scheduler::new();
        let mut delegate = RecordingDelegate::new();
        sched.add(periodic("sync", 1));
        sched.set_enabled(false);

        for _ in 0..10 {
            sched.tick(100, &mut delegate);
        }
        assert!(delegate.fires.is_empty());
    }
}
