use std::io;

use wiseguy::error::Error;
use wiseguy::markup::MarkupError;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }

    let err: Error = MarkupError::NoMatch("#main".to_string()).into();
    assert!(matches!(err, Error::Markup(MarkupError::NoMatch(_))));
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::TemplateError("rendering failed".to_string());
    assert_eq!(err.to_string(), "Template error: rendering failed.");

    let err: Error = MarkupError::NoMatch("#main".to_string()).into();
    assert_eq!(
        err.to_string(),
        "Markup error: selector '#main' matched no element."
    );

    let err = Error::ValueType {
        key: "body".to_string(),
        expected: "markup",
    };
    assert_eq!(err.to_string(), "Input 'body' is not markup.");
}
