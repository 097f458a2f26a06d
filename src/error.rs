/// Error types for pivot table composition.
use thiserror::Error;

/// Result type for pivot table operations.
pub type Result<T> = std::result::Result<T, PivotError>;

/// Error types for pivot table operations.
#[derive(Error, Debug)]
pub enum PivotError {
    /// A required parameter was absent or empty
    #[error("parameter '{0}' is required")]
    MissingParameter(String),

    /// A parameter could not be parsed or describes a degenerate range
    #[error("{0}")]
    InvalidParameter(String),

    /// Referenced sheet is not part of the workbook
    #[error("sheet {0} does not exist")]
    UnknownSheet(String),

    /// Cell name could not be converted to coordinates
    #[error("invalid cell reference: {0}")]
    InvalidCellReference(String),

    /// Axis reference outside of the field order
    #[error("field index {index} is out of range for {len} fields")]
    FieldIndexOutOfRange { index: usize, len: usize },

    /// The workbook registry already holds the largest possible cache ID
    #[error("pivot cache registry id {0} has no successor")]
    RegistryExhausted(u32),

    /// A staged pivot table no longer matches the identifiers its host would allocate
    #[error("staged pivot table is stale: {0}")]
    StaleStage(String),

    /// Relationship allocation failed
    #[error("Invalid relationship: {0}")]
    Relationship(String),

    /// Content type registration failed
    #[error("Content type error: {0}")]
    ContentType(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Options could not be loaded
    #[error("Invalid pivot table options: {0}")]
    Config(String),

    /// Formatting into an XML buffer failed
    #[error("XML write error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl PivotError {
    /// Attach the name of the offending parameter to a range-parsing error.
    ///
    /// Only parameter errors are rewritten; everything else passes through with
    /// its kind and message untouched.
    pub fn in_parameter(self, name: &str) -> Self {
        match self {
            Self::InvalidParameter(reason) => {
                Self::InvalidParameter(format!("parameter '{}' parsing error: {}", name, reason))
            },
            Self::MissingParameter(_) => Self::MissingParameter(name.to_string()),
            other => other,
        }
    }
}

impl From<quick_xml::Error> for PivotError {
    fn from(err: quick_xml::Error) -> Self {
        PivotError::Xml(err.to_string())
    }
}
