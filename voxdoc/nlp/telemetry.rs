use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Builder configuring telemetry for the question-answering runtime.
pub struct NlpTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
}

impl NlpTelemetryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Info,
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the minimum level that reaches the log file.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<NlpTelemetry> {
        NlpTelemetry::new(self.module, self.log_path, self.min_level)
    }
}

/// Cheaply cloneable telemetry handle shared by every component.
#[derive(Clone)]
pub struct NlpTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for NlpTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NlpTelemetry")
            .field("module", &self.inner.module)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
}

impl NlpTelemetry {
    fn new(
        module: impl Into<String>,
        log_path: Option<PathBuf>,
        min_level: LogLevel,
    ) -> Result<Self> {
        let logger = if let Some(path) = log_path {
            Some(JsonLogger::with_min_level(path, min_level)?)
        } else {
            None
        };
        Ok(Self {
            inner: Arc::new(TelemetryInner {
                module: module.into(),
                logger,
            }),
        })
    }

    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> NlpTelemetryBuilder {
        NlpTelemetryBuilder::new(module)
    }

    /// Logs a structured record; a handle without a log path is a no-op.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let mut record = LogRecord::new(&self.inner.module, level, message);
            if let Some(obj) = metadata.as_object() {
                record.metadata = obj.clone();
            }
            logger.log(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_structured_lines() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nlp.log");
        let telemetry = NlpTelemetry::builder("nlp")
            .log_path(&log_path)
            .min_level(LogLevel::Info)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "nlp.answer.selected", json!({ "score": 3 }))
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "nlp.answer.keywords", json!({}))
            .unwrap();
        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("nlp.answer.selected"));
        assert!(!content.contains("nlp.answer.keywords"));
    }

    #[test]
    fn telemetry_without_path_is_silent() {
        let telemetry = NlpTelemetry::builder("nlp").build().unwrap();
        assert!(telemetry
            .log(LogLevel::Error, "nlp.unused", json!({ "x": 1 }))
            .is_ok());
    }
}
