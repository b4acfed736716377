//! Request relay worker
//!
//! Receives [`Task`]s from an mpsc channel, issues one GET per task, and posts
//! the (optionally projected) JSON body back to the caller. Failures are
//! reported through [`Diagnostics`] and never produce a reply.

pub mod diagnostics;
pub mod http;
pub mod request;
pub mod shaping;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::messaging::{ReplySink, Task};
use crate::observability::Metrics;
pub use diagnostics::{Diagnostics, RecordingDiagnostics, RelayError, TracingDiagnostics};
pub use http::{FetchError, HttpClient, HttpConfig, HttpFetch, HttpReply};
pub use request::{DELAY_MS, QueryEncoding, build_url};
pub use shaping::ResponseShape;

/// How tasks that arrive before earlier ones complete are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Relay immediately; replies follow completion order
    #[default]
    Concurrent,
    /// One relay at a time; replies follow submission order
    Serialized,
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub endpoint: EndpointConfig,
    pub shape: ResponseShape,
    pub dispatch: DispatchMode,
    pub encoding: QueryEncoding,
    pub channel_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            shape: ResponseShape::Full,
            dispatch: DispatchMode::Concurrent,
            encoding: QueryEncoding::Raw,
            channel_capacity: 64,
        }
    }
}

/// Relays tasks to the remote endpoint
#[derive(Clone)]
pub struct RelayWorker {
    config: Arc<WorkerConfig>,
    client: Arc<dyn HttpFetch>,
    diagnostics: Arc<dyn Diagnostics>,
    replies: Arc<dyn ReplySink>,
    metrics: Arc<Metrics>,
}

impl RelayWorker {
    pub fn new(
        config: WorkerConfig,
        client: Arc<dyn HttpFetch>,
        diagnostics: Arc<dyn Diagnostics>,
        replies: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            client,
            diagnostics,
            replies,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Start relaying `task` and return without waiting for the response
    pub fn on_task(&self, task: Task) -> JoinHandle<()> {
        let worker = self.clone();
        tokio::spawn(async move { worker.handle(task).await })
    }

    /// Relay one task to completion: post the result or report the failure
    pub async fn handle(&self, task: Task) {
        self.metrics.task_received();

        let span = info_span!("relay", task_id = %Uuid::new_v4(), from = %task.from);

        async {
            let outcome = match self.relay(&task).await {
                Ok(result) => self.replies.post(result).await.map_err(RelayError::from),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    self.metrics.result_posted();
                    debug!("Result posted");
                }
                Err(e) => {
                    self.metrics.relay_failed();
                    self.diagnostics.report(Some(&task.from), &e);
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fetch and shape the response for `task` without posting it
    pub async fn relay(&self, task: &Task) -> Result<Value, RelayError> {
        let url = build_url(&self.config.endpoint, task, self.config.encoding)?;

        let reply = self.client.get(&url).await?;

        // Only an exact 200 counts as success
        if reply.status != 200 {
            return Err(RelayError::Status(reply.status));
        }

        let body: Value = serde_json::from_slice(&reply.body)?;

        Ok(self.config.shape.apply(body))
    }

    /// Worker event loop; returns once `tasks` is closed and drained
    pub async fn run(self, mut tasks: mpsc::Receiver<Task>) {
        info!(dispatch = ?self.config.dispatch, shape = ?self.config.shape, "Relay worker started");

        let mut inflight = JoinSet::new();

        while let Some(task) = tasks.recv().await {
            match self.config.dispatch {
                DispatchMode::Concurrent => {
                    let worker = self.clone();
                    inflight.spawn(async move { worker.handle(task).await });
                }
                DispatchMode::Serialized => self.handle(task).await,
            }

            // Reap finished relays so the set does not grow unbounded
            while inflight.try_join_next().is_some() {}
        }

        debug!(inflight = inflight.len(), "Task channel closed, draining");
        while inflight.join_next().await.is_some() {}

        let snapshot = self.metrics.snapshot();
        info!(
            tasks_received = snapshot.tasks_received,
            results_posted = snapshot.results_posted,
            relays_failed = snapshot.relays_failed,
            "Relay worker stopped"
        );
    }
}

/// Channels and task handle of a running worker
pub struct WorkerHandle {
    pub tasks: mpsc::Sender<Task>,
    pub results: mpsc::Receiver<Value>,
    pub metrics: Arc<Metrics>,
    pub join: JoinHandle<()>,
}

/// Spawn a worker wired to fresh bounded channels
pub fn spawn(
    config: WorkerConfig,
    client: Arc<dyn HttpFetch>,
    diagnostics: Arc<dyn Diagnostics>,
) -> WorkerHandle {
    let capacity = config.channel_capacity.max(1);
    let (task_tx, task_rx) = mpsc::channel(capacity);
    let (result_tx, result_rx) = mpsc::channel::<Value>(capacity);

    let worker = RelayWorker::new(config, client, diagnostics, Arc::new(result_tx));
    let metrics = worker.metrics();
    let join = tokio::spawn(worker.run(task_rx));

    WorkerHandle {
        tasks: task_tx,
        results: result_rx,
        metrics,
        join,
    }
}
