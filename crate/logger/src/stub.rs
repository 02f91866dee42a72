use std::sync::Arc;

use crate::{
    console::{ConsoleSink, ConsoleStream},
    logger::{merge_fields, ready, render_fields},
    Fields, FlushFuture, Level, Logger,
};

/// Console logger used when the cloud backend is not available.
///
/// Lines read `{level} - [{name}] {message} {fields-json}`; `debug` and
/// `info` go to stdout, `warn` and `error` to stderr.
#[derive(Clone)]
pub struct StubLogger {
    name: String,
    fields: Fields,
    console: Arc<dyn ConsoleSink>,
}

impl StubLogger {
    pub fn new(name: impl Into<String>, console: Arc<dyn ConsoleSink>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
            console,
        }
    }

    pub(crate) fn format(&self, level: Level, message: &str, fields: Option<&Fields>) -> String {
        let merged = merge_fields(&self.fields, fields);
        match render_fields(&merged) {
            Some(json) => format!("{level} - [{}] {message} {json}", self.name),
            None => format!("{level} - [{}] {message}", self.name),
        }
    }
}

impl Logger for StubLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, level: Level, message: &str, fields: Option<&Fields>) {
        let line = self.format(level, message, fields);
        self.console.write_line(ConsoleStream::from(level), &line);
    }

    fn child(&self, fields: Fields) -> Box<dyn Logger> {
        Box::new(Self {
            name: self.name.clone(),
            fields: merge_fields(&self.fields, Some(&fields)),
            console: Arc::clone(&self.console),
        })
    }

    fn flush(&self) -> FlushFuture {
        ready(Ok(()))
    }
}
