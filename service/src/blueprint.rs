use tracing::Span;

use crate::Flow;

/// Options threaded through a [`Blueprint`] into every stage it
/// materializes.
///
/// Carries a structured logger ([`tracing::Span`]) rather than a plain
/// `log`-style logger, matching how the rest of this workspace emits
/// diagnostics. Cheap to clone: a `Span` is a handle, not the log records
/// themselves.
#[derive(Clone)]
pub struct MatOpts {
    logger: Span,
}

impl MatOpts {
    pub fn new() -> Self {
        Self { logger: Span::current() }
    }

    pub fn with_logger(logger: Span) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }
}

impl Default for MatOpts {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-argument factory for a stage or sink tree.
///
/// Pipeline topology (which stages, in which order) is decided once, up
/// front; pipeline *lifetime* is tied to one subscribe session. A
/// blueprint decouples the two: the outer retry driver holds one
/// `Blueprint` and calls [`Blueprint::materialize`] again on every
/// reconnect to get a fresh, independently-closeable flow tree without
/// rebuilding the topology from scratch.
pub trait Blueprint {
    type Flow: Flow;

    fn materialize(&self, opts: &MatOpts) -> Self::Flow;
}

/// Adapts a plain closure into a [`Blueprint`].
pub fn fn_blueprint<F, Fl>(f: F) -> FnBlueprint<F>
where
    F: Fn(&MatOpts) -> Fl,
    Fl: Flow,
{
    FnBlueprint { f }
}

#[derive(Clone)]
pub struct FnBlueprint<F> {
    f: F,
}

impl<F, Fl> Blueprint for FnBlueprint<F>
where
    F: Fn(&MatOpts) -> Fl,
    Fl: Flow,
{
    type Flow = Fl;

    fn materialize(&self, opts: &MatOpts) -> Self::Flow {
        (self.f)(opts)
    }
}
