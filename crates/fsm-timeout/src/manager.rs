// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The timeout manager: one cancellable, schedulable timer per machine
//! (§4.3). Each armed timer runs as its own cooperative task on the
//! tokio runtime's worker pool rather than a hand-rolled thread pool —
//! callbacks never run inline with `schedule`/`cancel`.

use crate::handle::{ArmedTimer, TimeoutStats};
use fsm_core::MachineId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

type OnFire = Arc<dyn Fn(MachineId, String, String) + Send + Sync>;

struct Counters {
    scheduled: AtomicU64,
    fired: AtomicU64,
    cancelled: AtomicU64,
    in_flight: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            scheduled: AtomicU64::new(0),
            fired: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
        }
    }
}

/// Shared, cloneable handle to the timer map. Cloning shares state —
/// every clone schedules and cancels timers on the same underlying map.
#[derive(Clone)]
pub struct TimeoutManager {
    timers: Arc<Mutex<HashMap<MachineId, ArmedTimer>>>,
    on_fire: OnFire,
    counters: Arc<Counters>,
    next_generation: Arc<AtomicU64>,
}

impl TimeoutManager {
    /// `on_fire` is invoked when a timer elapses without being cancelled
    /// first; it receives the machine id, the state the timer was armed
    /// in, and the state the synthesised `TIMEOUT` event transitions to.
    /// It is responsible for enqueuing that event (§4.2) — staleness
    /// against the machine's actual current state is checked at the head
    /// of its mailbox, not here.
    pub fn new(on_fire: impl Fn(MachineId, String, String) + Send + Sync + 'static) -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            on_fire: Arc::new(on_fire),
            counters: Arc::new(Counters::default()),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Arm a timer for `machine_id`, cancelling any prior one (§4.3: one
    /// active timer per machine).
    pub fn schedule(&self, machine_id: MachineId, delay: Duration, armed_for_state: impl Into<String>, target_state: impl Into<String>) {
        let armed_for_state = armed_for_state.into();
        let target_state = target_state.into();
        self.cancel(&machine_id);

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

        let timers = Arc::clone(&self.timers);
        let on_fire = Arc::clone(&self.on_fire);
        let counters = Arc::clone(&self.counters);
        let fire_id = machine_id.clone();
        let fire_source_state = armed_for_state.clone();
        let fire_target_state = target_state.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Only remove (and fire) the entry if it's still the one this
            // task armed: a concurrent `schedule` may have replaced it
            // with a newer timer for the same machine id by the time this
            // task wakes, and that newer timer must not be clobbered.
            let fired = {
                let mut timers = timers.lock();
                match timers.get(&fire_id) {
                    Some(armed) if armed.generation == generation => {
                        timers.remove(&fire_id);
                        true
                    }
                    _ => false,
                }
            };
            if !fired {
                return;
            }
            counters.fired.fetch_add(1, Ordering::Relaxed);
            counters.in_flight.fetch_add(1, Ordering::Relaxed);
            on_fire(fire_id, fire_source_state, fire_target_state);
            counters.in_flight.fetch_sub(1, Ordering::Relaxed);
        });

        self.timers.lock().insert(machine_id, ArmedTimer { armed_for_state, generation, task });
        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Cancel any pending timer for `machine_id`. Idempotent; returns
    /// whether a timer was actually cancelled.
    pub fn cancel(&self, machine_id: &MachineId) -> bool {
        let removed = self.timers.lock().remove(machine_id);
        match removed {
            Some(timer) => {
                timer.abort();
                self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// The state a pending timer for `machine_id` is armed for, if any.
    pub fn armed_for_state(&self, machine_id: &MachineId) -> Option<String> {
        self.timers.lock().get(machine_id).map(|t| t.armed_for_state.clone())
    }

    pub fn stats(&self) -> TimeoutStats {
        TimeoutStats {
            scheduled: self.counters.scheduled.load(Ordering::Relaxed),
            fired: self.counters.fired.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            active: self.timers.lock().len() as u64,
        }
    }

    /// Graceful shutdown (§4.3, §5): cancel every timer that has not yet
    /// fired, then wait up to `grace` for any in-flight callback (one
    /// that already passed the staleness check and is running `on_fire`)
    /// to finish.
    pub async fn shutdown(&self, grace: Duration) {
        let pending: Vec<MachineId> = self.timers.lock().keys().cloned().collect();
        for id in pending {
            self.cancel(&id);
        }

        let deadline = tokio::time::Instant::now() + grace;
        while self.counters.in_flight.load(Ordering::Relaxed) > 0 {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!("timeout manager shutdown grace period elapsed with callbacks still in flight");
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
