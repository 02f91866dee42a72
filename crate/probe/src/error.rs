use thiserror::Error;

/// Exit status used when a required dependency is missing
pub const MISSING_DEPENDENCY_EXIT_CODE: i32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("{dependency} not available: {reason}")]
    Missing {
        dependency: &'static str,
        reason: String,
        remediation: &'static str,
        caller: String,
    },
}

impl ProbeError {
    /// The diagnostic printed before terminating: names the dependency, the
    /// remediation and the calling program.
    #[must_use]
    pub fn fatal_message(&self) -> String {
        match self {
            Self::Missing {
                dependency,
                reason,
                remediation,
                caller,
            } => format!(
                "[devkit] FATAL: {dependency} not available ({reason}).\n{remediation}\n(caller: \
                 {caller})"
            ),
        }
    }

    /// Write [`Self::fatal_message`] to stderr and terminate the process with
    /// status 1.
    pub fn exit(&self) -> ! {
        eprintln!("{}", self.fatal_message());
        std::process::exit(MISSING_DEPENDENCY_EXIT_CODE)
    }
}

/// Terminate on a missing required dependency instead of propagating it.
pub trait OrExit<T> {
    fn or_exit(self) -> T;
}

impl<T> OrExit<T> for Result<T, ProbeError> {
    fn or_exit(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => err.exit(),
        }
    }
}
