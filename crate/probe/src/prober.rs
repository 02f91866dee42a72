use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        OnceLock,
    },
};

use tracing::{debug, info};

use crate::{ProbeContext, ProbeError, RunContext};

/// Outcome of the single load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Availability<T> {
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub const fn available(&self) -> Option<&T> {
        match self {
            Self::Available(dependency) => Some(dependency),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Whether a missing dependency may be replaced by a stub outside CI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Missing outside CI is fatal
    Required,
    /// Always degrade to the stub
    Optional,
}

/// What the caller should use.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, T> {
    Real(&'a T),
    Degraded,
}

/// Probe an optional dependency at most once and cache the outcome.
///
/// Probers are meant to live in a `static`; the loader passed to the first
/// [`Prober::probe`] call wins and is never retried.
pub struct Prober<T> {
    dependency: &'static str,
    remediation: &'static str,
    outcome: OnceLock<Availability<T>>,
    attempts: AtomicUsize,
    announced: AtomicBool,
}

impl<T> Prober<T> {
    #[must_use]
    pub const fn new(dependency: &'static str, remediation: &'static str) -> Self {
        Self {
            dependency,
            remediation,
            outcome: OnceLock::new(),
            attempts: AtomicUsize::new(0),
            announced: AtomicBool::new(false),
        }
    }

    pub const fn dependency(&self) -> &'static str {
        self.dependency
    }

    /// Run `load` unless a previous call already did, and return the cached
    /// outcome.
    pub fn probe<F, E>(&self, load: F) -> &Availability<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Display,
    {
        self.outcome.get_or_init(|| {
            self.attempts.fetch_add(1, Ordering::AcqRel);
            match load() {
                Ok(dependency) => {
                    debug!("{} loaded", self.dependency);
                    Availability::Available(dependency)
                }
                Err(e) => {
                    debug!("{} failed to load: {e}", self.dependency);
                    Availability::Unavailable {
                        reason: e.to_string(),
                    }
                }
            }
        })
    }

    /// The cached outcome, if a probe already ran.
    pub fn outcome(&self) -> Option<&Availability<T>> {
        self.outcome.get()
    }

    /// Number of load attempts: 0 before the first probe, 1 afterwards.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }

    /// Probe, then apply the fallback policy:
    /// - present: use it,
    /// - absent in CI, or absent and optional: degrade and print one notice,
    /// - absent, required and local: [`ProbeError::Missing`].
    pub fn resolve<F, E>(
        &self,
        context: &ProbeContext,
        requirement: Requirement,
        load: F,
    ) -> Result<Resolution<'_, T>, ProbeError>
    where
        F: FnOnce() -> Result<T, E>,
        E: Display,
    {
        match self.probe(load) {
            Availability::Available(dependency) => Ok(Resolution::Real(dependency)),
            Availability::Unavailable { reason } => {
                if context.run == RunContext::Local && requirement == Requirement::Required {
                    return Err(ProbeError::Missing {
                        dependency: self.dependency,
                        reason: reason.clone(),
                        remediation: self.remediation,
                        caller: context.caller.clone(),
                    });
                }
                self.announce(context, reason);
                Ok(Resolution::Degraded)
            }
        }
    }

    fn announce(&self, context: &ProbeContext, reason: &str) {
        if self.announced.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(
            dependency = self.dependency,
            run = %context.run,
            "substituting stub: {reason}"
        );
        println!(
            "[devkit] {} not available, using stub (caller: {})",
            self.dependency, context.caller
        );
    }

    /// Whether the substitution notice has been printed.
    pub fn announced(&self) -> bool {
        self.announced.load(Ordering::Acquire)
    }
}
