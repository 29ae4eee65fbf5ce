//! Simulation controller: owner of all mutable state.
//!
//! The controller is the only place state changes. It exposes two commands,
//! [`SimulationController::start`] and [`SimulationController::reset`], and
//! applies the stages armed by `start` when [`SimulationController::poll`]
//! finds them due on its clock. Every change is published to observers as
//! an owned [`SimulationState`].
//!
//! ```text
//!            start()                 last stage fired
//!   Idle ─────────────► Running ─────────────────────► Completed
//!    ▲                    │                                │
//!    └──── reset() ───────┴──────────── reset() ───────────┘
//! ```
//!
//! `start` always resets first, so a second `start` cancels the pending run
//! before arming a fresh one.

use std::sync::mpsc::{self, Receiver};

use log::{debug, info, warn};

use crate::clock::{Clock, ManualClock};
use crate::config::SimulationConfig;
use crate::entity::{self, Complex, Unit};
use crate::error::{PhiError, Result};
use crate::observer::{Delivery, StateObserver};
use crate::schedule::{self, Action, Stage};
use crate::scheduler::{ScheduledEntry, Scheduler};
use crate::state::{RunPhase, SimulationState, IDLE_EXPERIENCE};

pub struct SimulationController<C: Clock> {
    clock: C,
    config: SimulationConfig,
    /// Schedule armed by every `start`
    table: Vec<ScheduledEntry<Stage>>,
    scheduler: Scheduler<Stage>,
    processes: Vec<Unit>,
    complex: Complex,
    resulting_experience: String,
    phase: RunPhase,
    elapsed_ms: u64,
    revision: u64,
    observers: Vec<Box<dyn StateObserver>>,
}

impl<C: Clock> SimulationController<C> {
    /// Controller over the default processes, complex and activation sequence.
    pub fn new(clock: C, config: SimulationConfig) -> Result<Self> {
        let table = schedule::activation_sequence(&config)?;
        Self::with_parts(
            clock,
            config,
            entity::default_processes(),
            entity::default_complex(),
            table,
        )
    }

    /// Controller over a custom repertoire and schedule table.
    ///
    /// The table must have at least one entry, otherwise a started run could
    /// never complete.
    pub fn with_parts(
        clock: C,
        config: SimulationConfig,
        processes: Vec<Unit>,
        complex: Complex,
        table: Vec<ScheduledEntry<Stage>>,
    ) -> Result<Self> {
        config.validate()?;
        if table.is_empty() {
            return Err(PhiError::EmptySchedule);
        }
        let all_units: Vec<Unit> = processes
            .iter()
            .chain(complex.elements())
            .cloned()
            .collect();
        entity::ensure_unique_ids(&all_units)?;

        let mut controller = Self {
            clock,
            config,
            table,
            scheduler: Scheduler::new(),
            processes,
            complex,
            resulting_experience: IDLE_EXPERIENCE.to_string(),
            phase: RunPhase::Idle,
            elapsed_ms: 0,
            revision: 0,
            observers: Vec::new(),
        };
        controller.restore_defaults();
        Ok(controller)
    }

    /// Reset, then arm a fresh run of the activation sequence from now.
    pub fn start(&mut self) {
        self.reset();

        let now = self.clock.now_ms();
        self.scheduler.arm(self.table.iter().cloned(), now);
        self.phase = RunPhase::Running;
        self.elapsed_ms = 0;
        info!(
            "activation run armed: {} stages, generation {}",
            self.scheduler.pending_count(),
            self.scheduler.generation()
        );
        self.publish();
    }

    /// Cancel any pending run and restore every unit to its default.
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            info!("pending run cancelled: {cancelled} stages dropped");
        }
        self.restore_defaults();
        self.phase = RunPhase::Idle;
        self.elapsed_ms = 0;
        self.publish();
    }

    /// Fire every stage that is due on the clock. Returns the number fired.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;

        while let Some(next) = self.scheduler.pop_due(now) {
            let started = self.scheduler.armed_at_ms().unwrap_or(next.due_ms);
            self.elapsed_ms = next.due_ms.saturating_sub(started);
            self.apply_stage(&next.effect);

            if !self.scheduler.is_armed() {
                self.phase = RunPhase::Completed;
                info!("activation run completed after {} ms", self.elapsed_ms);
            }
            self.publish();
            fired += 1;
        }

        fired
    }

    pub fn snapshot(&self) -> SimulationState {
        SimulationState {
            revision: self.revision,
            phase: self.phase,
            elapsed_ms: self.elapsed_ms,
            processes: self.processes.clone(),
            complex: self.complex.clone(),
            integration_score: self.complex.integration_score(),
            resulting_experience: self.resulting_experience.clone(),
        }
    }

    /// Subscribe over a channel. The current snapshot is sent immediately,
    /// followed by every later publish.
    pub fn subscribe(&mut self) -> Receiver<SimulationState> {
        let (tx, rx) = mpsc::channel();
        self.add_observer(Box::new(tx));
        rx
    }

    /// Register an observer. It is called with the current snapshot first.
    pub fn add_observer(&mut self, mut observer: Box<dyn StateObserver>) {
        if observer.on_state(&self.snapshot()) == Delivery::Keep {
            self.observers.push(observer);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Clock time at which the next stage is due.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.scheduler.next_deadline_ms()
    }

    pub fn pending_stages(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn restore_defaults(&mut self) {
        for process in &mut self.processes {
            process.restore_default();
        }
        self.complex.restore_defaults();
        self.resulting_experience = IDLE_EXPERIENCE.to_string();
    }

    fn apply_stage(&mut self, stage: &Stage) {
        debug!("stage '{}' fired at +{} ms", stage.label, self.elapsed_ms);

        for action in &stage.actions {
            match action {
                Action::ActivateProcess(id) => {
                    match self.processes.iter_mut().find(|p| p.id() == id) {
                        Some(process) => process.activate(),
                        None => warn!("stage '{}': no process '{id}', skipped", stage.label),
                    }
                }
                Action::ActivateElement(id) => {
                    if !self.complex.activate_element(id) {
                        warn!("stage '{}': no complex element '{id}', skipped", stage.label);
                    }
                }
                Action::RecomputeExperience => {
                    self.resulting_experience = self.complex.experience_description();
                }
            }
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        let snapshot = self.snapshot();
        self.observers
            .retain_mut(|observer| observer.on_state(&snapshot) == Delivery::Keep);
    }
}

impl SimulationController<ManualClock> {
    /// Move virtual time forward by `ms` and fire whatever became due.
    pub fn advance_by(&mut self, ms: u64) -> usize {
        self.clock.advance(ms);
        self.poll()
    }

    /// Run virtual time forward until nothing is pending.
    pub fn run_to_completion(&mut self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.scheduler.next_deadline_ms() {
            self.clock.set(deadline);
            fired += self.poll();
        }
        fired
    }
}
