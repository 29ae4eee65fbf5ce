//! Real-time host for the simulation controller.
//!
//! One tokio task owns the controller. It waits for either a command or the
//! scheduler's next deadline, whichever comes first, so every mutation
//! happens on that task. The deadline is recomputed from the scheduler on
//! every iteration: after a `Reset` or a fresh `Start` there is no timer
//! left over from the cancelled run.
//!
//! ```text
//!  DriverHandle ──Command──► ┌──────────────── driver task ───────────────┐
//!                            │ select! { command, sleep_until(deadline) } │
//!                            │         SimulationController::poll()       │
//!                            └──────────────────┬─────────────────────────┘
//!                                               │ SimulationState (in order)
//!                                               ▼
//!                                         snapshot receiver
//! ```

use anyhow::Result;
use phi_core::{
    saturating_millis, Clock, Delivery, ManualClock, RunPhase, SimulationConfig,
    SimulationController, SimulationState, StateObserver,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Shutdown,
}

/// When the driver task ends on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Stop once a run completes
    AfterRun,
    /// Keep serving commands until `Shutdown` or every handle is dropped
    UntilShutdown,
}

/// Clock on tokio's timeline, so paused test time drives the schedule too.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn instant_at(&self, ms: u64) -> Instant {
        self.origin + Duration::from_millis(ms)
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        saturating_millis(self.origin.elapsed())
    }
}

struct SnapshotForwarder(UnboundedSender<SimulationState>);

impl StateObserver for SnapshotForwarder {
    fn on_state(&mut self, snapshot: &SimulationState) -> Delivery {
        match self.0.send(snapshot.clone()) {
            Ok(()) => Delivery::Keep,
            Err(_) => Delivery::Detach,
        }
    }
}

/// Cloneable command side of a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: UnboundedSender<Command>,
}

impl DriverHandle {
    /// Send a command. Returns false if the driver has already stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn reset(&self) -> bool {
        self.send(Command::Reset)
    }

    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }
}

pub struct SpawnedDriver {
    pub handle: DriverHandle,
    /// Every published snapshot, starting with the initial one
    pub snapshots: UnboundedReceiver<SimulationState>,
    pub task: JoinHandle<()>,
}

struct Driver {
    controller: SimulationController<TokioClock>,
    clock: TokioClock,
    commands: UnboundedReceiver<Command>,
    policy: ExitPolicy,
}

/// Spawn the driver task on the current tokio runtime.
pub fn spawn(config: SimulationConfig, policy: ExitPolicy) -> Result<SpawnedDriver> {
    let clock = TokioClock::new();
    let mut controller = SimulationController::new(clock, config)?;

    let (snapshot_tx, snapshots) = mpsc::unbounded_channel();
    controller.add_observer(Box::new(SnapshotForwarder(snapshot_tx)));

    let (command_tx, commands) = mpsc::unbounded_channel();
    let driver = Driver {
        controller,
        clock,
        commands,
        policy,
    };
    let task = tokio::spawn(driver.run());

    Ok(SpawnedDriver {
        handle: DriverHandle {
            commands: command_tx,
        },
        snapshots,
        task,
    })
}

impl Driver {
    async fn run(mut self) {
        info!(policy = ?self.policy, "Simulation driver started");

        loop {
            let deadline = self
                .controller
                .next_deadline_ms()
                .map(|ms| self.clock.instant_at(ms));
            let wake_at = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Start) => {
                        debug!("start command");
                        self.controller.start();
                    }
                    Some(Command::Reset) => {
                        debug!("reset command");
                        self.controller.reset();
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    let fired = self.controller.poll();
                    debug!(fired, revision = self.controller.revision(), "stages fired");

                    if self.policy == ExitPolicy::AfterRun
                        && self.controller.phase() == RunPhase::Completed
                    {
                        break;
                    }
                }
            }
        }

        info!(
            revision = self.controller.revision(),
            phase = ?self.controller.phase(),
            "Simulation driver stopped"
        );
    }
}

/// Run one activation sequence on virtual time, without sleeping.
///
/// With `until_ms`, virtual time stops there and the run may be left
/// unfinished. Returns every published snapshot in order.
pub fn fast_forward(config: SimulationConfig, until_ms: Option<u64>) -> Result<Vec<SimulationState>> {
    let mut controller = SimulationController::new(ManualClock::new(), config)?;
    let updates = controller.subscribe();

    controller.start();
    match until_ms {
        Some(limit) => {
            controller.advance_by(limit);
        }
        None => {
            controller.run_to_completion();
        }
    }

    Ok(updates.try_iter().collect())
}
