//! Error handling for wiseguy.
//! Defines the crate-wide error type and result alias.

use std::io;
use thiserror::Error;

use crate::markup::MarkupError;

/// Custom error types for wiseguy operations.
///
/// This enum represents all possible errors that can occur while building,
/// composing and rendering templates. It implements the standard Error trait
/// through thiserror's derive macro.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Raised by the markup tree, e.g. a selector that matches nothing
    #[error("Markup error: {0}.")]
    Markup(#[from] MarkupError),

    /// Represents errors that occur during template processing
    #[error("Template error: {0}.")]
    TemplateError(String),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Errors from rendering minijinja content expressions
    #[error("Content expression error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// A content function read a key that is not part of its resolved inputs
    #[error("Missing input '{key}'.")]
    MissingKey { key: String },

    /// A content function found a value of the wrong kind
    #[error("Input '{key}' is not {expected}.")]
    ValueType { key: String, expected: &'static str },

    /// Template lookup in a registry failed
    #[error("Template '{name}' is not registered.")]
    TemplateNotFound { name: String },

    /// A name was registered twice
    #[error("Template '{name}' is already registered.")]
    DuplicateTemplate { name: String },
}

/// Convenience type alias for Results with Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
