use thiserror::Error;

/// Boxed inner cause carried by parse errors (I/O, URL, date formats).
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum OboError {
    #[error("Parse error at line {line}: {message} (line: {text:?})")]
    Parse {
        message: String,
        line: usize,
        text: String,
        #[source]
        source: Option<Cause>,
    },
    #[error("Frame structure error: {message} in frame: {frame}")]
    FrameStructure { frame: String, message: String },
    #[error("Frame merge error: {message}")]
    FrameMerge { message: String },
    #[error("Invalid xref map for id space {id_space}: {message}")]
    XrefMacroConfig { id_space: String, message: String },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Could not read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OboError>;

impl OboError {
    pub fn parse(message: impl Into<String>, line: usize, text: impl Into<String>) -> Self {
        Self::Parse { message: message.into(), line, text: text.into(), source: None }
    }
    pub fn parse_caused(
        message: impl Into<String>,
        line: usize,
        text: impl Into<String>,
        cause: impl Into<Cause>,
    ) -> Self {
        Self::Parse { message: message.into(), line, text: text.into(), source: Some(cause.into()) }
    }
    pub fn structure(frame: impl ToString, message: impl Into<String>) -> Self {
        Self::FrameStructure { frame: frame.to_string(), message: message.into() }
    }
    pub fn merge(message: impl Into<String>) -> Self {
        Self::FrameMerge { message: message.into() }
    }
    pub fn xref_macro(id_space: impl Into<String>, message: impl Into<String>) -> Self {
        Self::XrefMacroConfig { id_space: id_space.into(), message: message.into() }
    }
    /// Line number for parse errors, `None` for everything else.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

// Helper conversions
impl From<config::ConfigError> for OboError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
