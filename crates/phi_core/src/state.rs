use serde::Serialize;

use crate::entity::{Complex, Unit};

/// Resulting experience while no run has reached the complex.
pub const IDLE_EXPERIENCE: &str = "Awaiting stimulus: no activation sequence has reached the complex.";

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Nothing pending; defaults restored
    #[default]
    Idle,
    /// A schedule is armed and has stages left to fire
    Running,
    /// The last run's schedule drained naturally; nothing pending
    Completed,
}

impl RunPhase {
    /// True when no mutation is pending.
    pub fn is_settled(self) -> bool {
        !matches!(self, RunPhase::Running)
    }
}

/// Owned, read-only snapshot of the whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    /// Publish counter; increases by one per published snapshot
    pub revision: u64,
    pub phase: RunPhase,
    /// Logical time since the current run was armed
    pub elapsed_ms: u64,
    pub processes: Vec<Unit>,
    pub complex: Complex,
    /// Derived from the complex at snapshot time
    pub integration_score: f64,
    pub resulting_experience: String,
}

impl SimulationState {
    pub fn process(&self, id: &str) -> Option<&Unit> {
        self.processes.iter().find(|p| p.id() == id)
    }

    pub fn element(&self, id: &str) -> Option<&Unit> {
        self.complex.element(id)
    }

    pub fn active_process_ids(&self) -> Vec<&str> {
        self.processes
            .iter()
            .filter(|p| p.is_active())
            .map(Unit::id)
            .collect()
    }

    pub fn active_element_ids(&self) -> Vec<&str> {
        self.complex
            .elements()
            .iter()
            .filter(|e| e.is_active())
            .map(Unit::id)
            .collect()
    }

    /// Compare everything except the publish bookkeeping (revision, elapsed time).
    pub fn same_content(&self, other: &SimulationState) -> bool {
        self.phase == other.phase
            && self.processes == other.processes
            && self.complex == other.complex
            && self.resulting_experience == other.resulting_experience
    }
}
