use crate::engine::continuous::ContinuousCaptureEngine;
use crate::engine::native::NativeProcessEngine;
use crate::engine::platform::PlatformCodecEngine;
use crate::engine::{EngineContext, EngineKind, ExportEngine};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::timeline::settings::ExportSettings;

type ProbeFn = Box<dyn Fn(&EngineContext, &ExportSettings) -> ReelpressResult<()> + Send + Sync>;
type ConstructFn = Box<
    dyn Fn(&EngineContext, &ExportSettings) -> ReelpressResult<Box<dyn ExportEngine>>
        + Send
        + Sync,
>;

/// One candidate in the fallback chain: a capability probe plus a constructor.
pub struct EngineProvider {
    kind: EngineKind,
    needs_scratch_dir: bool,
    probe: ProbeFn,
    construct: ConstructFn,
}

impl EngineProvider {
    /// Provider from closures.
    pub fn new<P, C>(kind: EngineKind, needs_scratch_dir: bool, probe: P, construct: C) -> Self
    where
        P: Fn(&EngineContext, &ExportSettings) -> ReelpressResult<()> + Send + Sync + 'static,
        C: Fn(&EngineContext, &ExportSettings) -> ReelpressResult<Box<dyn ExportEngine>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind,
            needs_scratch_dir,
            probe: Box::new(probe),
            construct: Box::new(construct),
        }
    }

    /// Built-in provider for `kind`.
    pub fn builtin(kind: EngineKind) -> Self {
        match kind {
            EngineKind::NativeProcess => Self::new(
                kind,
                true,
                |ctx, _| NativeProcessEngine::probe(ctx),
                |ctx, _| {
                    Ok(Box::new(NativeProcessEngine::new(ctx.clone())) as Box<dyn ExportEngine>)
                },
            ),
            EngineKind::PlatformCodec => Self::new(
                kind,
                false,
                PlatformCodecEngine::probe,
                |ctx, settings| {
                    Ok(Box::new(PlatformCodecEngine::new(ctx.clone(), settings)?)
                        as Box<dyn ExportEngine>)
                },
            ),
            EngineKind::ContinuousCaptureOptimized => Self::new(
                kind,
                false,
                move |ctx, _| ContinuousCaptureEngine::probe(ctx, kind),
                |ctx, _| {
                    Ok(Box::new(ContinuousCaptureEngine::optimized(ctx.clone()))
                        as Box<dyn ExportEngine>)
                },
            ),
            EngineKind::ContinuousCapture => Self::new(
                kind,
                false,
                move |ctx, _| ContinuousCaptureEngine::probe(ctx, kind),
                |ctx, _| {
                    Ok(Box::new(ContinuousCaptureEngine::new(ctx.clone())) as Box<dyn ExportEngine>)
                },
            ),
        }
    }

    /// Engine this provider builds.
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Whether the engine expects a session scratch directory.
    pub fn needs_scratch_dir(&self) -> bool {
        self.needs_scratch_dir
    }
}

impl std::fmt::Debug for EngineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineProvider")
            .field("kind", &self.kind)
            .field("needs_scratch_dir", &self.needs_scratch_dir)
            .finish_non_exhaustive()
    }
}

/// An engine picked by [`EngineFactory::select`].
pub struct SelectedEngine {
    /// Constructed engine.
    pub engine: Box<dyn ExportEngine>,
    /// Whether the session must provide a scratch directory.
    pub needs_scratch_dir: bool,
    /// Candidates rejected before this one, in probe order.
    pub rejected: Vec<String>,
}

/// Ordered fallback chain of engine providers.
#[derive(Debug)]
pub struct EngineFactory {
    providers: Vec<EngineProvider>,
}

impl Default for EngineFactory {
    fn default() -> Self {
        Self::with_order(&EngineKind::DEFAULT_ORDER)
    }
}

impl EngineFactory {
    /// Factory over an explicit provider list, tried in order.
    pub fn new(providers: Vec<EngineProvider>) -> Self {
        Self { providers }
    }

    /// Built-in providers in the given order (duplicates ignored).
    pub fn with_order(order: &[EngineKind]) -> Self {
        let mut kinds: Vec<EngineKind> = Vec::with_capacity(order.len());
        for kind in order {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        Self::new(kinds.into_iter().map(EngineProvider::builtin).collect())
    }

    /// Kinds in probe order.
    pub fn order(&self) -> Vec<EngineKind> {
        self.providers.iter().map(EngineProvider::kind).collect()
    }

    /// Instantiate the first candidate whose probe and constructor both succeed.
    ///
    /// Earlier failures are logged and collected, never returned, unless every candidate fails.
    pub fn select(
        &self,
        ctx: &EngineContext,
        settings: &ExportSettings,
    ) -> ReelpressResult<SelectedEngine> {
        let mut rejected = Vec::new();
        for provider in &self.providers {
            let attempt = (provider.probe)(ctx, settings)
                .and_then(|()| (provider.construct)(ctx, settings));
            match attempt {
                Ok(engine) => {
                    tracing::info!(
                        engine = %provider.kind,
                        skipped = rejected.len(),
                        "export engine selected"
                    );
                    return Ok(SelectedEngine {
                        engine,
                        needs_scratch_dir: provider.needs_scratch_dir,
                        rejected,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        engine = %provider.kind,
                        error = %e,
                        "export engine unavailable"
                    );
                    rejected.push(format!("{}: {e}", provider.kind));
                }
            }
        }
        Err(ReelpressError::NoUsableEngine { attempts: rejected })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/factory.rs"]
mod tests;
