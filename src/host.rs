//! Hosts a relay worker over stdin/stdout

use relaybox::config::Config;
use relaybox::messaging::Task;
use relaybox::worker::{
    self, Diagnostics, HttpClient, RelayError, TracingDiagnostics, WorkerHandle,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(config: Config) -> Result<(), AnyError> {
    let client = HttpClient::new(&config.http_config())?;
    let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);

    info!(
        endpoint = %format!("{}{}", config.endpoint.base_url, config.endpoint.path),
        "Relay host reading tasks from stdin"
    );

    let handle = worker::spawn(config.worker_config(), Arc::new(client), diagnostics.clone());
    let input = BufReader::new(tokio::io::stdin());

    serve(handle, diagnostics, input, tokio::io::stdout(), shutdown_signal()).await?;
    Ok(())
}

/// Relay one task and wait for its result, if any
pub async fn send_one(config: Config, task: Task) -> Result<Option<Value>, AnyError> {
    let client = HttpClient::new(&config.http_config())?;
    let WorkerHandle {
        tasks,
        mut results,
        join,
        ..
    } = worker::spawn(config.worker_config(), Arc::new(client), Arc::new(TracingDiagnostics));

    tasks.send(task).await?;
    drop(tasks);
    join.await?;

    Ok(results.recv().await)
}

/// Forward newline-delimited JSON tasks from `input` to the worker and write
/// each result as one JSON line to `output`.
///
/// Stops reading on EOF, a read error or `shutdown`; in-flight relays still
/// complete and their results are written before returning.
pub async fn serve<R, W, F>(
    handle: WorkerHandle,
    diagnostics: Arc<dyn Diagnostics>,
    input: R,
    output: W,
    shutdown: F,
) -> Result<W, AnyError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    F: Future<Output = ()>,
{
    let WorkerHandle {
        tasks,
        results,
        metrics,
        join,
    } = handle;

    let writer = tokio::spawn(write_results(results, output));

    // Split on raw bytes so a line that is not UTF-8 is just another bad task
    let mut lines = input.split(b'\n');
    let mut read_error = None;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            segment = lines.next_segment() => {
                let line = match segment {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read input, finishing in-flight relays");
                        read_error = Some(e);
                        break;
                    }
                };
                let line = line.trim_ascii();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_slice::<Task>(line) {
                    Ok(task) => {
                        if tasks.send(task).await.is_err() {
                            warn!("Worker stopped, no longer accepting tasks");
                            break;
                        }
                    }
                    Err(e) => diagnostics.report(None, &RelayError::InvalidTask(e.to_string())),
                }
            }
            _ = &mut shutdown => {
                info!("Finishing in-flight relays");
                break;
            }
        }
    }

    drop(tasks);
    join.await?;
    let output = writer.await??;

    let snapshot = metrics.snapshot();
    info!(
        results_posted = snapshot.results_posted,
        relays_failed = snapshot.relays_failed,
        "Relay host stopped"
    );

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(output),
    }
}

async fn write_results<W>(mut results: mpsc::Receiver<Value>, mut output: W) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(result) = results.recv().await {
        let mut line = result.to_string();
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(output)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
