/// Error types for sqlx-chainer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error during SQL template parsing
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// The initial connection to the database could not be established
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// The database rejected or failed a statement
    #[error("Execution error: {0}")]
    Execution(#[source] sqlx::Error),

    /// Any other error reported by SQLx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A column of a fetched row could not be decoded
    #[error("Failed to decode column '{column}': {source}")]
    Decode {
        column: String,
        #[source]
        source: sqlx::Error,
    },

    /// Invalid connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A statement operation was called before `prepare`
    #[error("No statement has been prepared")]
    NoStatement,

    /// Placeholder was referenced but no value was bound to it
    #[error("Placeholder '{0}' was not bound")]
    UnboundPlaceholder(String),

    /// A value was bound to a placeholder the prepared statement does not contain
    #[error("Placeholder '{0}' does not appear in the prepared statement")]
    UnknownPlaceholder(String),

    /// The same placeholder would be generated twice for one statement
    #[error("Placeholder '{0}' is already used in this statement")]
    DuplicatePlaceholder(String),

    /// A value cannot be converted to the requested binding type
    #[error("Cannot bind '{placeholder}': {message}")]
    Coercion { placeholder: String, message: String },

    /// A table or column name cannot be safely quoted
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// A generated statement needs at least one column
    #[error("{operation} requires at least one column")]
    EmptyColumns { operation: &'static str },

    /// A generated statement needs at least one condition
    #[error("{operation} requires at least one condition")]
    EmptyConditions { operation: &'static str },

    /// A multi-row insert row does not match the columns of the first row
    #[error("Row {row} does not list the same columns as the first row")]
    HeterogeneousRow { row: usize },
}

/// Result type alias for sqlx-chainer operations
pub type Result<T> = std::result::Result<T, Error>;
