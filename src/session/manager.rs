use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context as _;

use crate::config::ExportConfig;
use crate::engine::{EngineContext, EngineKind, ExportJob};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::render::compositor::AssetWarning;
use crate::session::abort::AbortSignal;
use crate::session::factory::EngineFactory;
use crate::session::progress::{ProgressReporter, ProgressSink};
use crate::timeline::model::Timeline;
use crate::timeline::settings::ExportSettings;

/// Lifecycle of the manager's current (or last) export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No export has run yet, or a new one is about to start.
    Idle,
    /// Probing and constructing an engine.
    Selecting,
    /// The engine is rendering and encoding.
    Running,
    /// The engine resolved; output is being verified and resources released.
    Finalizing,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
    /// Finished because the abort signal fired.
    Cancelled,
}

impl SessionState {
    /// Whether the state ends a job.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// Result of a successful export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedFile {
    /// Written video file.
    pub path: PathBuf,
    /// Engine that produced it.
    pub engine: EngineKind,
    /// Frames encoded.
    pub frame_count: u64,
    /// `frame_count / fps`, in seconds.
    pub duration_secs: f64,
    /// Elements skipped during compositing.
    pub warnings: Vec<AssetWarning>,
    /// Engines tried and rejected before the one used, as `"<engine>: <reason>"`.
    pub skipped_engines: Vec<String>,
}

/// Per-job resources. Dropping it deletes the scratch directory.
struct ExportSession {
    id: u64,
    scratch: Option<tempfile::TempDir>,
}

impl ExportSession {
    fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|d| d.path())
    }

    fn release(&mut self) {
        if let Some(dir) = self.scratch.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => tracing::debug!(
                    session = self.id,
                    dir = %path.display(),
                    "scratch directory removed"
                ),
                Err(e) => tracing::warn!(
                    session = self.id,
                    dir = %path.display(),
                    error = %e,
                    "failed to remove scratch directory"
                ),
            }
        }
    }
}

impl Drop for ExportSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Claim on the manager's state for one job. Dropping it before a terminal state was recorded
/// (a panicking engine) marks the job failed so the manager accepts new work.
struct StateClaim<'a> {
    manager: &'a SessionManager,
    session: u64,
}

impl Drop for StateClaim<'_> {
    fn drop(&mut self) {
        if !self.manager.state().is_terminal() {
            self.manager.transition(self.session, SessionState::Failed);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn remove_partial_output(path: &Path) {
    if path.exists() {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to remove partial output"
            ),
        }
    }
}

/// Hidden sibling of the output the engine writes into; renamed over it only on success.
///
/// Keeps the container extension so `ffmpeg` picks the same muxer it would for the real path.
fn staging_path(settings: &ExportSettings, session: u64) -> PathBuf {
    let target = &settings.output_path;
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let ext = target
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(settings.container.extension());
    target.with_file_name(format!(".{name}.reelpress-{session}.{ext}"))
}

/// Owns the "one export at a time" rule and the engine fallback chain.
///
/// `export` takes `&self`: a second call while one is running fails immediately with
/// [`ReelpressError::ExportInProgress`] and leaves the running job untouched.
pub struct SessionManager {
    ctx: EngineContext,
    factory: EngineFactory,
    state: Mutex<SessionState>,
    history: Mutex<Vec<SessionState>>,
    next_session: AtomicU64,
}

impl SessionManager {
    /// Manager using the production decoder and the configured (or default) engine chain.
    pub fn new(config: ExportConfig) -> ReelpressResult<Self> {
        let config = config.normalized()?;
        let factory = match &config.engine_order {
            Some(order) => EngineFactory::with_order(order),
            None => EngineFactory::default(),
        };
        Ok(Self::with_factory(EngineContext::new(config), factory))
    }

    /// Manager over an explicit context and factory.
    pub fn with_factory(ctx: EngineContext, factory: EngineFactory) -> Self {
        Self {
            ctx,
            factory,
            state: Mutex::new(SessionState::Idle),
            history: Mutex::new(vec![SessionState::Idle]),
            next_session: AtomicU64::new(0),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &ExportConfig {
        &self.ctx.config
    }

    /// Engine chain in probe order.
    pub fn engine_order(&self) -> Vec<EngineKind> {
        self.factory.order()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// States visited by the current or last job, starting with `Idle`.
    pub fn history(&self) -> Vec<SessionState> {
        lock(&self.history).clone()
    }

    /// Whether an export is running, i.e. the state is neither `Idle` nor terminal.
    pub fn is_busy(&self) -> bool {
        let state = self.state();
        state != SessionState::Idle && !state.is_terminal()
    }

    /// Move from `Idle` or a terminal state straight to `Selecting` under the state lock.
    fn claim(&self) -> ReelpressResult<StateClaim<'_>> {
        let mut state = lock(&self.state);
        if *state != SessionState::Idle && !state.is_terminal() {
            return Err(ReelpressError::ExportInProgress);
        }
        let session = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            session,
            from = ?*state,
            to = ?SessionState::Selecting,
            "session transition"
        );
        *state = SessionState::Selecting;
        *lock(&self.history) = vec![SessionState::Idle, SessionState::Selecting];
        Ok(StateClaim {
            manager: self,
            session,
        })
    }

    fn transition(&self, session: u64, to: SessionState) {
        let mut state = lock(&self.state);
        tracing::info!(session, from = ?*state, to = ?to, "session transition");
        *state = to;
        lock(&self.history).push(to);
    }

    /// Render `timeline` with `settings` into one video file.
    ///
    /// `progress` receives non-decreasing percentages with a stage message, at least once per
    /// completed frame. Setting `abort` stops the job at the next frame boundary; the call then
    /// returns [`ReelpressError::Cancelled`] after the same cleanup as any other exit.
    #[tracing::instrument(skip_all, fields(out = %settings.output_path.display()))]
    pub fn export(
        &self,
        timeline: &Timeline,
        settings: &ExportSettings,
        progress: impl ProgressSink + 'static,
        abort: AbortSignal,
    ) -> ReelpressResult<ExportedFile> {
        let claim = self.claim()?;
        let id = claim.session;

        let reporter = ProgressReporter::new(progress);
        let result = self.run(id, timeline, settings, &reporter, &abort);
        let terminal = match &result {
            Ok(_) => SessionState::Done,
            Err(e) if e.is_cancelled() => SessionState::Cancelled,
            Err(_) => SessionState::Failed,
        };
        if let Err(e) = &result {
            tracing::warn!(session = id, error = %e, "export did not complete");
        }
        self.transition(id, terminal);
        drop(claim);
        result
    }

    fn run(
        &self,
        id: u64,
        timeline: &Timeline,
        settings: &ExportSettings,
        reporter: &ProgressReporter,
        abort: &AbortSignal,
    ) -> ReelpressResult<ExportedFile> {
        reporter.report(0.0, "selecting engine");
        timeline.validate()?;
        settings.validate()?;
        abort.check()?;

        let selected = self.factory.select(&self.ctx, settings)?;
        if !selected.rejected.is_empty() {
            tracing::info!(
                session = id,
                skipped = ?selected.rejected,
                "fell back past unavailable engines"
            );
        }
        let mut session = ExportSession { id, scratch: None };
        if selected.needs_scratch_dir {
            let root = self.ctx.config.temp_root();
            std::fs::create_dir_all(&root)
                .with_context(|| format!("create temp root '{}'", root.display()))?;
            let dir = tempfile::Builder::new()
                .prefix(&format!("reelpress-session-{id}-"))
                .tempdir_in(&root)
                .with_context(|| format!("create session directory in '{}'", root.display()))?;
            session.scratch = Some(dir);
        }

        self.transition(id, SessionState::Running);
        let mut engine = selected.engine;
        let kind = engine.kind();
        let staged = ExportSettings {
            output_path: staging_path(settings, id),
            ..settings.clone()
        };
        let job = ExportJob {
            timeline,
            settings: &staged,
            reporter,
            abort,
            scratch_dir: session.scratch_dir(),
        };
        let outcome = engine.export(&job);
        drop(engine);

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                session.release();
                remove_partial_output(&staged.output_path);
                return Err(e);
            }
        };

        self.transition(id, SessionState::Finalizing);
        reporter.report(reporter.last(), "finalizing");
        session.release();
        if !output.path.is_file() {
            return Err(ReelpressError::evaluation(format!(
                "engine '{kind}' reported success but '{}' was not written",
                output.path.display()
            )));
        }
        if let Err(e) = std::fs::rename(&output.path, &settings.output_path) {
            remove_partial_output(&output.path);
            return Err(anyhow::Error::new(e)
                .context(format!(
                    "move finished export into '{}'",
                    settings.output_path.display()
                ))
                .into());
        }

        let duration_secs = output.frame_count as f64 * settings.fps.frame_duration_secs();
        tracing::info!(
            session = id,
            engine = %kind,
            frames = output.frame_count,
            duration_secs,
            warnings = output.warnings.len(),
            "export finished"
        );
        reporter.report(100.0, "done");
        Ok(ExportedFile {
            path: settings.output_path.clone(),
            engine: kind,
            frame_count: output.frame_count,
            duration_secs,
            warnings: output.warnings,
            skipped_engines: selected.rejected,
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("engine_order", &self.engine_order())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/manager.rs"]
mod tests;
