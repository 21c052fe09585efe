//! Pipeline execution.

use crate::config::{PipelineConfig, StageCommand};
use crate::error::{PipelineError, PipelineResult};
use crate::log_buffer::LogBuffer;
use crate::state::{PipelineState, Stage};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vsense_telemetry::Metrics;

/// How long to wait for output readers once the child has exited.
const READER_GRACE: Duration = Duration::from_secs(2);

const FETCH_DONE_LINE: &str = "Data fetch complete, starting model training...";
const TRAIN_DONE_LINE: &str = "Model training complete.";

/// One pipeline run: its state and accumulated output.
#[derive(Debug)]
pub struct PipelineRun {
    id: u64,
    state: RwLock<PipelineState>,
    log: LogBuffer,
    started_at: DateTime<Utc>,
    finished_at: RwLock<Option<DateTime<Utc>>>,
}

impl PipelineRun {
    fn new(id: u64) -> Self {
        Self {
            id,
            state: RwLock::new(PipelineState::Idle),
            log: LogBuffer::new(),
            started_at: Utc::now(),
            finished_at: RwLock::new(None),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> PipelineState {
        *self.state.read()
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *self.finished_at.read()
    }

    fn transition(&self, next: PipelineState) -> PipelineResult<()> {
        let mut state = self.state.write();
        if !state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition { from: *state, to: next });
        }
        debug!(run_id = self.id, from = %*state, to = %next, "Pipeline transition");
        *state = next;
        if next.is_terminal() {
            *self.finished_at.write() = Some(Utc::now());
        }
        Ok(())
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Succeeded {
        logs: String,
    },
    Failed {
        stage: Stage,
        error: String,
        logs: String,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Succeeded { .. })
    }

    pub fn logs(&self) -> &str {
        match self {
            PipelineOutcome::Succeeded { logs } | PipelineOutcome::Failed { logs, .. } => logs,
        }
    }
}

/// Snapshot of the current run for polling clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    pub run_id: Option<u64>,
    pub state: PipelineState,
    /// Log text from the requested offset.
    pub logs: String,
    /// Offset to request next.
    pub offset: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Single-flight runner for the fetch → train pipeline.
pub struct PipelineRunner {
    config: PipelineConfig,
    current: RwLock<Option<Arc<PipelineRun>>>,
    next_id: AtomicU64,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The most recent run, finished or not.
    pub fn current_run(&self) -> Option<Arc<PipelineRun>> {
        self.current.read().clone()
    }

    /// Claim the pipeline for a new run, moving it to `Fetching`.
    pub fn begin(&self) -> PipelineResult<Arc<PipelineRun>> {
        let mut current = self.current.write();
        if let Some(run) = current.as_ref() {
            let state = run.state();
            if state.is_active() {
                Metrics::pipeline_run("rejected");
                warn!(run_id = run.id(), %state, "Pipeline start rejected, run in progress");
                return Err(PipelineError::Busy(state));
            }
        }

        let run = Arc::new(PipelineRun::new(self.next_id.fetch_add(1, Ordering::Relaxed)));
        run.transition(PipelineState::Fetching)?;
        *current = Some(run.clone());
        Ok(run)
    }

    /// Start a run and wait for it to finish.
    ///
    /// The run executes on its own task, so dropping the returned future does
    /// not abandon the child processes mid-stage.
    pub async fn trigger(self: &Arc<Self>) -> PipelineResult<PipelineOutcome> {
        let run = self.begin()?;
        let runner = Arc::clone(self);
        let handle = tokio::spawn(async move { runner.execute(run).await });
        handle.await.map_err(|e| PipelineError::Task(e.to_string()))
    }

    /// Drive `run` through both stages.
    pub async fn execute(&self, run: Arc<PipelineRun>) -> PipelineOutcome {
        info!(run_id = run.id(), "Starting data fetch");
        if !self.run_stage(&run, Stage::Fetch).await {
            return self.fail(&run, Stage::Fetch);
        }

        run.log.append_line(FETCH_DONE_LINE);
        if let Err(e) = run.transition(Stage::Train.running_state()) {
            error!(run_id = run.id(), error = %e, "Cannot enter training");
            return self.fail(&run, Stage::Train);
        }

        info!(run_id = run.id(), "Data fetch complete, starting model training");
        if !self.run_stage(&run, Stage::Train).await {
            return self.fail(&run, Stage::Train);
        }

        run.log.append_line(TRAIN_DONE_LINE);
        if let Err(e) = run.transition(PipelineState::Succeeded) {
            error!(run_id = run.id(), error = %e, "Cannot mark run succeeded");
            return self.fail(&run, Stage::Train);
        }

        Metrics::pipeline_run("succeeded");
        info!(run_id = run.id(), "Model training complete");
        PipelineOutcome::Succeeded {
            logs: run.log.contents(),
        }
    }

    fn fail(&self, run: &PipelineRun, stage: Stage) -> PipelineOutcome {
        if let Err(e) = run.transition(PipelineState::Failed) {
            warn!(run_id = run.id(), error = %e, "Failed-state transition rejected");
        }
        Metrics::pipeline_run(match stage {
            Stage::Fetch => "fetch_failed",
            Stage::Train => "train_failed",
        });
        error!(run_id = run.id(), %stage, "{}", stage.failure_message());
        PipelineOutcome::Failed {
            stage,
            error: stage.failure_message().to_string(),
            logs: run.log.contents(),
        }
    }

    fn command_for(&self, stage: Stage) -> &StageCommand {
        match stage {
            Stage::Fetch => &self.config.fetch,
            Stage::Train => &self.config.train,
        }
    }

    /// Run one stage to completion. Returns whether it exited successfully.
    async fn run_stage(&self, run: &Arc<PipelineRun>, stage: Stage) -> bool {
        let stage_cmd = self.command_for(stage);
        let started = Instant::now();

        let mut cmd = Command::new(&stage_cmd.program);
        cmd.args(&stage_cmd.args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(run_id = run.id(), %stage, command = %stage_cmd.display(), "Spawning stage");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                run.log
                    .append_line(&format!("[{stage}] failed to start {}: {e}", stage_cmd.program));
                Metrics::pipeline_stage(stage.as_str(), "failed", started.elapsed().as_secs_f64());
                return false;
            }
        };

        let mut readers = vec![
            tokio::spawn(pump(child.stdout.take(), run.clone())),
            tokio::spawn(pump(child.stderr.take(), run.clone())),
        ];

        let timeout = self.config.stage_timeout();
        let success = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => true,
            Ok(Ok(status)) => {
                drain(&mut readers).await;
                run.log.append_line(&format!("[{stage}] exited with {status}"));
                false
            }
            Ok(Err(e)) => {
                run.log.append_line(&format!("[{stage}] wait failed: {e}"));
                false
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(run_id = run.id(), %stage, error = %e, "Failed to kill timed-out stage");
                }
                drain(&mut readers).await;
                run.log.append_line(&format!(
                    "[{stage}] timed out after {}s",
                    timeout.as_secs()
                ));
                false
            }
        };
        drain(&mut readers).await;

        let elapsed = started.elapsed().as_secs_f64();
        Metrics::pipeline_stage(stage.as_str(), if success { "ok" } else { "failed" }, elapsed);
        info!(run_id = run.id(), %stage, success, elapsed_secs = elapsed, "Stage finished");
        success
    }

    /// Current run state plus log text from `since`.
    pub fn status(&self, since: usize) -> PipelineStatus {
        match self.current_run() {
            None => PipelineStatus {
                run_id: None,
                state: PipelineState::Idle,
                logs: String::new(),
                offset: 0,
                started_at: None,
                finished_at: None,
            },
            Some(run) => {
                let chunk = run.log.read_from(since);
                PipelineStatus {
                    run_id: Some(run.id()),
                    state: run.state(),
                    logs: chunk.text,
                    offset: chunk.next_offset,
                    started_at: Some(run.started_at()),
                    finished_at: run.finished_at(),
                }
            }
        }
    }
}

/// Append every line of `reader` to the run log.
///
/// Invalid UTF-8 is replaced, never fatal: the pipe stays open until EOF.
async fn pump<R>(reader: Option<R>, run: Arc<PipelineRun>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let raw = String::from_utf8_lossy(&buf);
                let line = raw.trim_end_matches(['\n', '\r']);
                debug!(run_id = run.id(), "{line}");
                run.log.append_line(line);
            }
            Err(e) => {
                warn!(run_id = run.id(), error = %e, "Stage output read failed");
                break;
            }
        }
    }
}

/// Wait briefly for output readers, abandoning any still blocked.
///
/// A grandchild holding the pipe open would otherwise stall the run.
async fn drain(readers: &mut Vec<JoinHandle<()>>) {
    for mut handle in readers.drain(..) {
        if tokio::time::timeout(READER_GRACE, &mut handle).await.is_err() {
            handle.abort();
        }
    }
}
