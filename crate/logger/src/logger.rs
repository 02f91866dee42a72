use std::{fmt, future::Future, pin::Pin};

use serde_json::{Map, Value};

use crate::LoggerError;

/// Structured fields attached to a record, in insertion order
pub type Fields = Map<String, Value>;

/// Completion of [`Logger::flush`]
pub type FlushFuture = Pin<Box<dyn Future<Output = Result<(), LoggerError>> + Send + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named structured logger.
///
/// Implementations only provide [`Logger::log`], [`Logger::child`] and
/// [`Logger::flush`]; the level methods forward to `log`.
pub trait Logger: Send + Sync {
    /// The name given to the factory
    fn name(&self) -> &str;

    fn log(&self, level: Level, message: &str, fields: Option<&Fields>);

    /// A new logger adding `fields` to every record. The child owns its copy
    /// of the merged fields.
    fn child(&self, fields: Fields) -> Box<dyn Logger>;

    fn flush(&self) -> FlushFuture;

    fn debug(&self, message: &str, fields: Option<&Fields>) {
        self.log(Level::Debug, message, fields);
    }

    fn info(&self, message: &str, fields: Option<&Fields>) {
        self.log(Level::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: Option<&Fields>) {
        self.log(Level::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: Option<&Fields>) {
        self.log(Level::Error, message, fields);
    }
}

/// Parent fields first, then `fields`; a key present in both keeps its
/// position and takes the new value.
pub(crate) fn merge_fields(parent: &Fields, fields: Option<&Fields>) -> Fields {
    let mut merged = parent.clone();
    if let Some(fields) = fields {
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Compact JSON, or `None` when there is nothing to render.
pub(crate) fn render_fields(fields: &Fields) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    serde_json::to_string(fields).ok()
}

pub(crate) fn ready(result: Result<(), LoggerError>) -> FlushFuture {
    Box::pin(std::future::ready(result))
}

/// Build [`Fields`] with `serde_json::json!` object syntax.
///
/// ```ignore
/// let log = logger.child(fields!({ "request_id": id, "attempt": 2 }));
/// ```
#[macro_export]
macro_rules! fields {
    ($($json:tt)+) => {
        match $crate::reexport::serde_json::json!($($json)+) {
            $crate::reexport::serde_json::Value::Object(map) => map,
            _ => $crate::Fields::new(),
        }
    };
}
