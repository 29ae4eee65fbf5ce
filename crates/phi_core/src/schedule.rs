//! The activation schedule table.
//!
//! A run is a fixed list of stages. Each stage fires at a delay from the
//! start of the run, applies its actions together, and produces one
//! published snapshot.
//!
//! | Stage | Delay (default) | Actions                                        |
//! |-------|-----------------|------------------------------------------------|
//! | 1     | 0.5 s           | activate `retina`                              |
//! | 2     | 1.0 s           | activate `afferent-pathway`                    |
//! | 3     | 1.5 s           | activate element `blue`, recompute experience  |
//! | 4     | 2.0 s           | activate `motor-pathway`, `subcortical-loop`   |
//!
//! The experience is only recomputed in stage 3; later stages touch
//! insulated processes, which do not change what is experienced.

use crate::config::SimulationConfig;
use crate::error::{PhiError, Result};
use crate::scheduler::ScheduledEntry;

/// A single state mutation applied when a stage fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ActivateProcess(String),
    ActivateElement(String),
    /// Set the resulting experience from the complex's current elements
    RecomputeExperience,
}

/// Actions applied and published together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub label: String,
    pub actions: Vec<Action>,
}

impl Stage {
    pub fn new(label: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            label: label.into(),
            actions,
        }
    }
}

/// The staged activation sequence, timed from `config`.
pub fn activation_sequence(config: &SimulationConfig) -> Result<Vec<ScheduledEntry<Stage>>> {
    config.validate()?;

    let stages = vec![
        Stage::new(
            "retinal input",
            vec![Action::ActivateProcess("retina".into())],
        ),
        Stage::new(
            "afferent relay",
            vec![Action::ActivateProcess("afferent-pathway".into())],
        ),
        Stage::new(
            "complex ignition",
            vec![
                Action::ActivateElement("blue".into()),
                Action::RecomputeExperience,
            ],
        ),
        Stage::new(
            "motor output",
            vec![
                Action::ActivateProcess("motor-pathway".into()),
                Action::ActivateProcess("subcortical-loop".into()),
            ],
        ),
    ];

    table_from_stages(config, stages)
}

/// Space `stages` evenly at the configured interval, starting one interval in.
pub fn table_from_stages(
    config: &SimulationConfig,
    stages: Vec<Stage>,
) -> Result<Vec<ScheduledEntry<Stage>>> {
    config.validate()?;
    if stages.is_empty() {
        return Err(PhiError::EmptySchedule);
    }

    Ok(stages
        .into_iter()
        .zip(1u64..)
        .map(|(stage, n)| ScheduledEntry::new(config.stage_delay_ms(n), stage))
        .collect())
}
