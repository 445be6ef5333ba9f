use thiserror::Error;

/// Main error type for the beat analysis pipeline.
#[derive(Error, Debug)]
pub enum BeatParserError {
    #[error("Invalid audio: {0}")]
    Audio(#[from] AudioError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid format: {0}")]
    Format(#[from] FormatError),

    #[error("Decoder failure: {0}")]
    DecoderFailure(String),

    #[error("Plugin '{plugin}' failed: {reason}")]
    PluginFailure { plugin: String, reason: String },

    #[error("Stream aborted: {0}")]
    StreamAborted(String),

    #[error("Internal computation failure in {stage}: {reason}")]
    ComputationFailure { stage: String, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Audio-specific errors: empty input, non-finite samples, length too short.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("audio buffer is empty")]
    Empty,

    #[error("audio contains a non-finite sample at index {index}")]
    NonFinite { index: usize },

    #[error("audio length {len} is shorter than frame size {frame_size}")]
    TooShort { len: usize, frame_size: usize },

    #[error("beat detection failed: {reason}")]
    BeatDetectionFailed { reason: String },

    #[error("invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Configuration-specific errors: out-of-range parameters, frozen config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("parameter '{name}' out of range: {value}")]
    OutOfRange { name: String, value: String },

    #[error("hop size {hop} cannot exceed frame size {frame}")]
    HopExceedsFrame { hop: usize, frame: usize },

    #[error("min_bpm {min} must be less than max_bpm {max}")]
    BpmRangeInverted { min: f32, max: f32 },

    #[error("weight '{name}' = {value} is outside [0, 1]")]
    WeightOutOfRange { name: String, value: f32 },

    #[error("configuration is frozen: a parse is already in flight")]
    Frozen,

    #[error("failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// WAV-decoding-specific errors: bad header, unsupported bit depth/channels.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("not a RIFF/WAVE file")]
    BadHeader,

    #[error("unsupported bit depth: {bits}")]
    UnsupportedBitDepth { bits: u16 },

    #[error("unsupported channel count: {channels}")]
    UnsupportedChannelCount { channels: u16 },

    #[error("unsupported sample rate: {rate} Hz")]
    UnsupportedSampleRate { rate: u32 },

    #[error("unsupported container extension: {extension}")]
    UnsupportedExtension { extension: String },
}

/// Convenience type alias for Results using BeatParserError
pub type Result<T> = std::result::Result<T, BeatParserError>;

impl BeatParserError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::FileNotFound(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message naming the failing stage.
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::Empty) => "audio buffer is empty".to_string(),
            Self::PluginFailure { plugin, reason } => {
                format!("plugin '{plugin}' aborted the parse: {reason}")
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
