//! The seam between the controller and the bridge.

use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};

use crate::errors::Error;
use crate::payload::LightCommand;
use crate::runtime::mpsc::{self, error::TrySendError};
use crate::runtime::{Handle, JoinHandle};
use crate::types::LampSet;

type Result<T> = std::result::Result<T, Error>;

/// Something that can deliver a [`LightCommand`] to lamps.
///
/// [`crate::Connection`] implements it over the bridge's HTTP interface. An
/// empty [`LampSet`] means every lamp.
pub trait Transport: Send + Sync + 'static {
    /// Deliver one command and wait for the bridge to acknowledge it.
    fn send(
        &self,
        command: &LightCommand,
        lamps: &LampSet,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// One queued delivery.
#[derive(Debug, Clone)]
struct Envelope {
    command: LightCommand,
    lamps: LampSet,
}

/// Bounded, fire-and-forget command queue.
///
/// Pushing never blocks: when the queue is full the command is dropped and
/// logged. A single worker task delivers queued commands one at a time, so
/// they reach the bridge in the order they were pushed.
#[derive(Debug, Clone)]
pub(crate) struct CommandQueue {
    tx: mpsc::Sender<Envelope>,
}

impl CommandQueue {
    /// Create the queue and spawn its delivery worker on `handle`.
    pub(crate) fn spawn<T: Transport>(
        transport: Arc<T>,
        capacity: usize,
        handle: &Handle,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = handle.spawn(deliver(transport, rx));
        (CommandQueue { tx }, worker)
    }

    /// Queue a command; returns `false` if it was dropped.
    pub(crate) fn push(&self, command: LightCommand, lamps: LampSet) -> bool {
        match self.tx.try_send(Envelope { command, lamps }) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!("command queue full, dropping {:?} for {}", job.command, job.lamps);
                false
            }
            Err(TrySendError::Closed(job)) => {
                warn!("command queue closed, dropping {:?} for {}", job.command, job.lamps);
                false
            }
        }
    }
}

async fn deliver<T: Transport>(transport: Arc<T>, mut rx: mpsc::Receiver<Envelope>) {
    while let Some(job) = rx.recv().await {
        debug!("sending {:?} to {}", job.command, job.lamps);
        if let Err(e) = transport.send(&job.command, &job.lamps).await {
            warn!("failed to send {:?} to {}: {e}", job.command, job.lamps);
        }
    }
    debug!("command queue closed");
}
