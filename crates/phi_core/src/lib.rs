//! Staged activation simulator.
//!
//! A fixed set of insulated processes and a main complex of elements switch
//! on along a timed schedule. Once the complex has an active element, the
//! resulting experience is derived from which elements are on.
//!
//! ```
//! use phi_core::{ManualClock, SimulationConfig, SimulationController};
//!
//! let mut sim = SimulationController::new(ManualClock::new(), SimulationConfig::default())?;
//! let updates = sim.subscribe();
//!
//! sim.start();
//! sim.advance_by(2_000);
//!
//! let state = sim.snapshot();
//! assert_eq!(state.active_element_ids(), vec!["blue"]);
//! assert_eq!(updates.try_iter().count(), 7);
//! # Ok::<(), phi_core::PhiError>(())
//! ```
//!
//! The integration score is a placeholder, not a real integrated
//! information calculation.

pub mod clock;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod observer;
pub mod schedule;
pub mod scheduler;
pub mod state;

pub use clock::{saturating_millis, Clock, ManualClock, MonotonicClock};
pub use config::SimulationConfig;
pub use controller::SimulationController;
pub use entity::{
    experience_description, integration_score, Complex, Role, Unit, NOTHINGNESS_EXPERIENCE,
};
pub use error::{PhiError, Result};
pub use observer::{CallbackObserver, Delivery, StateObserver};
pub use schedule::{Action, Stage};
pub use scheduler::{Fired, ScheduledEntry, Scheduler};
pub use state::{RunPhase, SimulationState, IDLE_EXPERIENCE};
