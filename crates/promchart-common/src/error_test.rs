//! Tests for error module

use crate::error::Error;

#[test]
fn test_is_not_found() {
    let err = Error::NotFound("tool".to_string());
    assert!(err.is_not_found());

    let err = Error::Internal("test".to_string());
    assert!(!err.is_not_found());
}

#[test]
fn test_is_connection_error() {
    let err = Error::PrometheusConnection("refused".to_string());
    assert!(err.is_connection_error());

    let err = Error::ModelConnection("refused".to_string());
    assert!(err.is_connection_error());

    let err = Error::PrometheusQuery("bad_data".to_string());
    assert!(!err.is_connection_error());

    assert!(!Error::NoModelAvailable.is_connection_error());
}

#[test]
fn test_error_display() {
    let err = Error::PrometheusConnection("connection refused".to_string());
    assert_eq!(
        format!("{}", err),
        "Prometheus connection error: connection refused"
    );

    let err = Error::NotFound("tool: bogus".to_string());
    assert_eq!(format!("{}", err), "Resource not found: tool: bogus");

    assert_eq!(
        format!("{}", Error::NoModelAvailable),
        "No available models of type llm"
    );
}

#[test]
fn test_serialization_error_from() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: Error = parse_err.into();
    assert!(matches!(err, Error::Serialization(_)));
}
