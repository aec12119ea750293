//! Error taxonomy. Coercion failures and descriptor failures are separate
//! types: a bad descriptor is fatal to the declaration that used it, while a
//! coercion failure only concerns the single value being assigned.

use thiserror::Error;

/// Failure raised while coercing one value into a target kind.
///
/// Numeric kinds never raise (unparseable input degrades to `0` / `0.0`);
/// only the textual-parse kinds (pattern, URI, dates) and wrapped-class
/// constructors can fail.
#[derive(Debug, Error)]
pub enum CoerceError {
    /// Input could not be compiled as a regular expression.
    #[error("invalid pattern {text:?}: {source}")]
    Pattern {
        text: String,
        #[source]
        source: regex::Error,
    },

    /// Input could not be parsed as a URI.
    #[error("malformed URI {text:?}: {source}")]
    UriParse {
        text: String,
        #[source]
        source: url::ParseError,
    },

    /// Input could not be parsed as a date, datetime or timestamp.
    #[error("unparseable date {text:?}")]
    DateParse { text: String },

    /// A wrapped-class constructor rejected the input value.
    #[error("cannot construct {class} from {input}: {reason}")]
    CoercionFailed {
        class: String,
        input: String,
        reason: String,
    },
}

/// A native type descriptor that could not be mapped to any Type Node.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("unsupported type descriptor: {0}")]
    UnsupportedDescriptor(String),
}

/// Failures from the parameter-set layer.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    NotFound(String),

    #[error(transparent)]
    Coerce(#[from] CoerceError),
}
