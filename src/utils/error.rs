use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevReadyError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Could not reach dev server at {origin}: {source}")]
    Transport {
        origin: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("wait: timeout {timeout_ms}ms")]
    WaitTimeout { timeout_ms: u128 },

    #[error("Process '{name}' failed: {message}")]
    Process { name: String, message: String },

    #[error("Scenario step {step} failed: {message}")]
    Scenario { step: usize, message: String },

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    FileSystem,
    Data,
    Harness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl DevReadyError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::TomlParse(_) => {
                ErrorCategory::Configuration
            }
            Self::Transport { .. } => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::Serialization(_) => ErrorCategory::Data,
            Self::WaitTimeout { .. }
            | Self::Process { .. }
            | Self::Scenario { .. }
            | Self::TaskFailed(_) => ErrorCategory::Harness,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a missed ping only leaves the browser on stale code
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::FileSystem | ErrorCategory::Harness => ErrorSeverity::Critical,
        }
    }

    /// Process exit code the binaries use for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config { message } => format!("Dev server origin problem: {}", message),
            Self::InvalidConfigValue { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::Transport { origin, .. } => format!("Could not reach dev server at {}", origin),
            Self::Io(e) => format!("File access failed: {}", e),
            Self::Serialization(e) => format!("Build manifest is not valid JSON: {}", e),
            Self::TomlParse(e) => format!("Scenario file is not valid TOML: {}", e),
            Self::WaitTimeout { timeout_ms } => {
                format!("Gave up waiting after {}ms", timeout_ms)
            }
            Self::Process { name, message } => format!("Process '{}': {}", name, message),
            Self::Scenario { step, message } => format!("Step {} failed: {}", step, message),
            Self::TaskFailed(e) => format!("Background task stopped: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Config { .. } => {
                "Pass --origin or set DEV_HTTP_ORIGIN to the dev server's base URL"
            }
            Self::InvalidConfigValue { .. } | Self::TomlParse(_) => {
                "Fix the reported setting and run again"
            }
            Self::Transport { .. } => "Make sure the dev server is running and listening",
            Self::Io(_) => "Check that the path exists and is readable",
            Self::Serialization(_) => "Rebuild so the assets manifest is regenerated",
            Self::WaitTimeout { .. } => "Raise the timeout or check the process output",
            Self::Process { .. } => "Run the command by hand to see why it fails",
            Self::Scenario { .. } => "Inspect the process logs printed above",
            Self::TaskFailed(_) => "Keep the runtime alive until pending pings finish",
        }
    }
}

pub type Result<T> = std::result::Result<T, DevReadyError>;
