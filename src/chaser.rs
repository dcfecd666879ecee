//! Chaser effect: lamps light up one after another in a loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::payload::LightCommand;
use crate::runtime::{self, Handle, JoinHandle};
use crate::status::LightState;
use crate::transport::CommandQueue;
use crate::types::{LampSet, PowerMode};

/// One running instance of the chaser loop.
struct ChaserCycle {
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Cycles {
    active: Option<ChaserCycle>,
    // Stopped cycles still finishing their last on/off pair.
    retired: Vec<JoinHandle<()>>,
}

/// Starts and stops the chaser loop.
///
/// At most one cycle is active. Each cycle owns its cancellation token, so a
/// quick stop/start pair never revives the previous loop.
pub(crate) struct ChaserEngine {
    state: Arc<LightState>,
    queue: CommandQueue,
    lamps: LampSet,
    interval: Duration,
    handle: Handle,
    cycles: Mutex<Cycles>,
}

impl ChaserEngine {
    pub(crate) fn new(
        state: Arc<LightState>,
        queue: CommandQueue,
        lamps: LampSet,
        interval: Duration,
        handle: Handle,
    ) -> Self {
        ChaserEngine {
            state,
            queue,
            lamps,
            interval,
            handle,
            cycles: Mutex::new(Cycles::default()),
        }
    }

    /// Start a cycle unless one is already running; returns whether it started.
    pub(crate) fn start(&self) -> bool {
        if self.lamps.is_empty() {
            warn!("chaser has no lamps to cycle through");
            return false;
        }
        let mut cycles = self.lock();
        if cycles
            .active
            .as_ref()
            .is_some_and(|cycle| !cycle.task.is_finished())
        {
            debug!("chaser already running");
            return false;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        self.state.set_chaser_lamp(1);
        self.state.set_chaser_on(true);
        let task = self.handle.spawn(run_cycle(
            Arc::clone(&self.state),
            self.queue.clone(),
            self.lamps.clone(),
            self.interval,
            Arc::clone(&cancel),
        ));
        cycles.active = Some(ChaserCycle { cancel, task });
        info!("chaser started over lamps {}", self.lamps);
        true
    }

    /// Ask the running cycle to finish; returns whether one was running.
    ///
    /// The loop completes its current on/off pair before it exits.
    pub(crate) fn stop(&self) -> bool {
        let mut cycles = self.lock();
        self.state.set_chaser_on(false);
        let Some(cycle) = cycles.active.take() else {
            return false;
        };
        cycle.cancel.store(true, Ordering::SeqCst);
        cycles.retired.retain(|task| !task.is_finished());
        cycles.retired.push(cycle.task);
        info!("chaser stopping");
        true
    }

    /// Whether any chaser loop task is still alive.
    pub(crate) fn is_looping(&self) -> bool {
        let mut cycles = self.lock();
        cycles.retired.retain(|task| !task.is_finished());
        !cycles.retired.is_empty()
            || cycles
                .active
                .as_ref()
                .is_some_and(|cycle| !cycle.task.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Cycles> {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_cycle(
    state: Arc<LightState>,
    queue: CommandQueue,
    lamps: LampSet,
    interval: Duration,
    cancel: Arc<AtomicBool>,
) {
    let mut position = 1;
    while !cancel.load(Ordering::SeqCst) {
        let Some(lamp) = lamps.get(position - 1) else {
            state.set_chaser_on(false);
            break;
        };
        let target = LampSet::single(lamp.clone());

        queue.push(LightCommand::from(&PowerMode::On), target.clone());
        runtime::sleep(interval).await;
        queue.push(LightCommand::from(&PowerMode::Off), target);
        runtime::sleep(interval).await;

        // A stopped cycle must not move the lamp of its successor.
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        position = position % lamps.len() + 1;
        state.set_chaser_lamp(position);
    }
    debug!("chaser loop exited at lamp {position}");
}
