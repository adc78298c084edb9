use std::error::Error;
use std::fmt;
use std::io;

/// Failures surfaced to the caller of a telemetry extraction
#[derive(Debug)]
pub enum TelemetryError {
    /// The source could not be opened for reading
    OpenFailed(OpenError),
    /// Structural data is present but contradicts itself beyond recovery
    ParseFailed(ParseError),
    /// Every recovery strategy ran and none produced a GPS point
    NoMetadata,
    /// Cancellation was observed before a result was produced
    Cancelled,
}

/// Source open failure
#[derive(Debug)]
pub struct OpenError {
    pub path: String,
    pub source: io::Error,
}

impl OpenError {
    pub fn new(path: impl Into<String>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Structural parse failure
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// MP4 box and index-table decoding errors
#[derive(Debug)]
pub enum Mp4Error {
    /// Generic MP4 error with a descriptive message
    Error { message: String },
    /// A required box was absent from its parent
    MissingBox { name: &'static str, parent: &'static str },
    /// A box payload is shorter than its declared contents
    Truncated {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl Mp4Error {
    pub fn new(message: impl Into<String>) -> Self {
        Mp4Error::Error {
            message: message.into(),
        }
    }
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::OpenFailed(err) => write!(f, "Open failed: {}", err),
            TelemetryError::ParseFailed(err) => write!(f, "Parse failed: {}", err),
            TelemetryError::NoMetadata => write!(f, "No GPS telemetry found"),
            TelemetryError::Cancelled => write!(f, "Extraction cancelled"),
        }
    }
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.source)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for Mp4Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mp4Error::Error { message } => write!(f, "MP4 error: {}", message),
            Mp4Error::MissingBox { name, parent } => {
                write!(f, "MP4 error: {} box not found in {} box", name, parent)
            }
            Mp4Error::Truncated {
                name,
                expected,
                actual,
            } => write!(
                f,
                "MP4 error: {} box too small: expected {} bytes, got {}",
                name, expected, actual
            ),
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TelemetryError::OpenFailed(err) => Some(&err.source),
            _ => None,
        }
    }
}
impl Error for OpenError {}
impl Error for ParseError {}
impl Error for Mp4Error {}

// Conversion implementations
impl From<ParseError> for TelemetryError {
    fn from(err: ParseError) -> Self {
        TelemetryError::ParseFailed(err)
    }
}

impl From<Mp4Error> for TelemetryError {
    fn from(err: Mp4Error) -> Self {
        TelemetryError::ParseFailed(ParseError::new(err.to_string()))
    }
}

// Reads only happen after the source is open, so a late I/O error means the
// structure pointed somewhere the file cannot satisfy.
impl From<io::Error> for TelemetryError {
    fn from(err: io::Error) -> Self {
        TelemetryError::ParseFailed(ParseError::new(format!("I/O error: {}", err)))
    }
}

impl From<io::Error> for Mp4Error {
    fn from(err: io::Error) -> Self {
        Mp4Error::new(format!("I/O error: {}", err))
    }
}

impl From<Mp4Error> for io::Error {
    fn from(err: Mp4Error) -> Self {
        io::Error::other(err)
    }
}

impl TelemetryError {
    /// Whether the outcome is the expected "file carries no telemetry" case
    pub fn is_no_metadata(&self) -> bool {
        matches!(self, TelemetryError::NoMetadata)
    }

    /// Stable name of the failure kind, for reports
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryError::OpenFailed(_) => "open_failed",
            TelemetryError::ParseFailed(_) => "parse_failed",
            TelemetryError::NoMetadata => "no_metadata",
            TelemetryError::Cancelled => "cancelled",
        }
    }
}

// Type alias for Result with TelemetryError
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Result alias for box-level decoding
pub type Mp4Result<T> = Result<T, Mp4Error>;
