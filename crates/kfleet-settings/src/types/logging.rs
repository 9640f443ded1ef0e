use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level (most verbose).
    Trace,
    /// Debug-level.
    Debug,
    /// Info-level.
    Info,
    /// Warning-level (default).
    #[default]
    Warn,
    /// Error-level (least verbose).
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a level name (case-insensitive).
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level written to stderr when `RUST_LOG` is unset.
    pub level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_serde_lowercase() {
        assert_eq!(
            serde_json::to_value(LogLevel::Debug).unwrap(),
            serde_json::json!("debug")
        );
        let parsed: LogLevel = serde_json::from_value(serde_json::json!("error")).unwrap();
        assert_eq!(parsed, LogLevel::Error);
    }

    #[test]
    fn level_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("Info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
