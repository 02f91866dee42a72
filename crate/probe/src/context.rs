use std::{env, ffi::OsStr, fmt, sync::OnceLock};

/// Environment variable set by CI providers
pub const CI_ENV: &str = "CI";

static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

/// Where the process runs: decides what happens when a dependency is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunContext {
    Ci,
    Local,
}

impl RunContext {
    /// Read the `CI` flag once; later calls return the cached value.
    pub fn detect() -> Self {
        *RUN_CONTEXT.get_or_init(|| Self::from_flag(env::var_os(CI_ENV).as_deref()))
    }

    /// Set and non-empty means CI.
    #[must_use]
    pub fn from_flag(value: Option<&OsStr>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::Ci,
            _ => Self::Local,
        }
    }

    #[must_use]
    pub const fn is_ci(self) -> bool {
        matches!(self, Self::Ci)
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ci => write!(f, "ci"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Run context plus the name of the calling program, used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeContext {
    pub run: RunContext,
    pub caller: String,
}

impl ProbeContext {
    pub fn new(run: RunContext, caller: impl Into<String>) -> Self {
        Self {
            run,
            caller: caller.into(),
        }
    }

    /// The cached run context, with `argv[0]` as caller.
    pub fn detect() -> Self {
        let caller = env::args_os()
            .next()
            .filter(|arg| !arg.is_empty())
            .map_or_else(|| "unknown".to_owned(), |arg| arg.to_string_lossy().into_owned());
        Self::new(RunContext::detect(), caller)
    }
}
