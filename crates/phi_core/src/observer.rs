//! Read side of the simulation.
//!
//! Presentation layers never touch controller state directly. They either
//! poll [`crate::SimulationController::snapshot`] or register a
//! [`StateObserver`], which receives every published snapshot in the order
//! the mutations were applied. Delivery is synchronous from the controller,
//! so nothing is dropped or reordered.

use std::sync::mpsc::Sender;

use crate::state::SimulationState;

/// Whether an observer wants further snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Keep,
    /// Remove this observer; it will not be called again
    Detach,
}

pub trait StateObserver: Send {
    fn on_state(&mut self, snapshot: &SimulationState) -> Delivery;
}

/// Unbounded channel subscription. Detaches once the receiver is dropped.
impl StateObserver for Sender<SimulationState> {
    fn on_state(&mut self, snapshot: &SimulationState) -> Delivery {
        match self.send(snapshot.clone()) {
            Ok(()) => Delivery::Keep,
            Err(_) => Delivery::Detach,
        }
    }
}

/// Observer backed by a closure.
pub struct CallbackObserver<F>(pub F);

impl<F> StateObserver for CallbackObserver<F>
where
    F: FnMut(&SimulationState) -> Delivery + Send,
{
    fn on_state(&mut self, snapshot: &SimulationState) -> Delivery {
        (self.0)(snapshot)
    }
}
