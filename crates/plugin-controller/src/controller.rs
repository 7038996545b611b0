//! Serialized dispatch of change notifications.
//!
//! A single worker task consumes notifications in arrival order and runs
//! one reconciliation pass per notification, so passes never overlap even
//! when notifications arrive from many producers.

use crate::error::{ReconcileError, Result};
use crate::reconciler::Reconciler;
use plugin_core::PluginResource;
use plugin_core::traits::ResourceStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A change to one plugin resource, or a background tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// `namespace/name` of the changed resource; empty for a tick
    pub key: String,
    /// Latest state, `None` on deletion or for a tick
    pub resource: Option<PluginResource>,
}

impl Notification {
    /// A resource was created or updated.
    #[must_use]
    pub fn changed(resource: PluginResource) -> Self {
        Self {
            key: resource.key(),
            resource: Some(resource),
        }
    }

    /// A resource was deleted or its key could not be resolved.
    #[must_use]
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            resource: None,
        }
    }

    /// No single resource changed.
    #[must_use]
    pub const fn tick() -> Self {
        Self {
            key: String::new(),
            resource: None,
        }
    }
}

/// Starts the notification worker.
#[derive(Debug)]
pub struct Controller;

impl Controller {
    /// Spawns the worker on the current Tokio runtime.
    ///
    /// After every pass the returned resource status is written through
    /// `store`, whether or not the pass succeeded.
    #[must_use]
    pub fn spawn(reconciler: Arc<Reconciler>, store: Arc<dyn ResourceStore>) -> ControllerHandle {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Notification>();

        let worker = tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                dispatch(&reconciler, store.as_ref(), notification).await;
            }
            tracing::debug!("Plugin controller worker stopped");
        });

        ControllerHandle { sender, worker }
    }
}

async fn dispatch(reconciler: &Reconciler, store: &dyn ResourceStore, notification: Notification) {
    let outcome = reconciler
        .reconcile(&notification.key, notification.resource)
        .await;

    if let Some(resource) = &outcome.resource {
        match store.update_status(resource).await {
            Ok(stored) => tracing::debug!(
                "Persisted status {} for {}",
                stored.status.cache_state,
                stored.key()
            ),
            Err(e) => tracing::warn!("Failed to persist status of {}: {}", resource.key(), e),
        }
    }

    if let Err(e) = outcome.result {
        tracing::warn!("Reconciliation for {:?} reported: {}", notification.key, e);
    }
}

/// Handle to a running controller.
#[derive(Debug)]
pub struct ControllerHandle {
    sender: mpsc::UnboundedSender<Notification>,
    worker: JoinHandle<()>,
}

impl ControllerHandle {
    /// Queues a notification.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Stopped`] if the worker has exited.
    pub fn notify(&self, notification: Notification) -> Result<()> {
        self.sender
            .send(notification)
            .map_err(|_| ReconcileError::Stopped)
    }

    /// Queues a background tick.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Stopped`] if the worker has exited.
    pub fn resync(&self) -> Result<()> {
        self.notify(Notification::tick())
    }

    /// Spawns a task queueing a tick every `interval`, starting now.
    ///
    /// The task ends once the controller shuts down.
    #[must_use]
    pub fn run_resync(&self, interval: Duration) -> JoinHandle<()> {
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if sender.send(Notification::tick()).is_err() {
                    break;
                }
            }
        })
    }

    /// Stops accepting notifications, drains the queue and waits for the
    /// worker to finish.
    ///
    /// Resync tasks from [`run_resync`](Self::run_resync) hold their own
    /// sender and must be aborted first.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Worker`] if the worker panicked.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.sender);
        self.worker.await?;
        Ok(())
    }
}
