use unleash_proxy_client::{ErrorCode, UnleashError};

#[test]
fn test_error_code_string_values() {
    assert_eq!(ErrorCode::NetworkError.as_str(), "NETWORK_ERROR");

    assert_eq!(ErrorCode::HttpBadRequest.as_str(), "HTTP_BAD_REQUEST");
    assert_eq!(ErrorCode::HttpUnauthorized.as_str(), "HTTP_UNAUTHORIZED");
    assert_eq!(ErrorCode::HttpForbidden.as_str(), "HTTP_FORBIDDEN");
    assert_eq!(ErrorCode::HttpNotFound.as_str(), "HTTP_NOT_FOUND");
    assert_eq!(ErrorCode::HttpRateLimited.as_str(), "HTTP_RATE_LIMITED");
    assert_eq!(ErrorCode::HttpServerError.as_str(), "HTTP_SERVER_ERROR");
    assert_eq!(ErrorCode::HttpTimeout.as_str(), "HTTP_TIMEOUT");
    assert_eq!(ErrorCode::HttpNetworkError.as_str(), "HTTP_NETWORK_ERROR");
    assert_eq!(ErrorCode::HttpInvalidResponse.as_str(), "HTTP_INVALID_RESPONSE");

    assert_eq!(ErrorCode::MetricsEncodeFailed.as_str(), "METRICS_ENCODE_FAILED");
    assert_eq!(ErrorCode::ClientStopped.as_str(), "CLIENT_STOPPED");
    assert_eq!(ErrorCode::RuntimeUnavailable.as_str(), "RUNTIME_UNAVAILABLE");

    assert_eq!(ErrorCode::ConfigInvalidUrl.as_str(), "CONFIG_INVALID_URL");
    assert_eq!(ErrorCode::ConfigInvalidInterval.as_str(), "CONFIG_INVALID_INTERVAL");
    assert_eq!(ErrorCode::ConfigMissingApiKey.as_str(), "CONFIG_MISSING_API_KEY");
    assert_eq!(ErrorCode::ConfigInvalidTimeout.as_str(), "CONFIG_INVALID_TIMEOUT");
}

#[test]
fn test_recoverable_errors() {
    assert!(ErrorCode::NetworkError.is_recoverable());
    assert!(ErrorCode::HttpTimeout.is_recoverable());
    assert!(ErrorCode::HttpNetworkError.is_recoverable());
    assert!(ErrorCode::HttpServerError.is_recoverable());
    assert!(ErrorCode::HttpRateLimited.is_recoverable());
}

#[test]
fn test_non_recoverable_errors() {
    assert!(!ErrorCode::HttpUnauthorized.is_recoverable());
    assert!(!ErrorCode::HttpNotFound.is_recoverable());
    assert!(!ErrorCode::HttpInvalidResponse.is_recoverable());
    assert!(!ErrorCode::ConfigInvalidUrl.is_recoverable());
    assert!(!ErrorCode::ConfigMissingApiKey.is_recoverable());
    assert!(!ErrorCode::ClientStopped.is_recoverable());
    assert!(!ErrorCode::RuntimeUnavailable.is_recoverable());
}

#[test]
fn test_unleash_error_creation() {
    let error = UnleashError::new(ErrorCode::HttpServerError, "Server Error: 503 - ");

    assert_eq!(error.code, ErrorCode::HttpServerError);
    assert_eq!(error.message, "Server Error: 503 - ");
    assert!(error.source.is_none());
    assert!(error.is_recoverable());
}

#[test]
fn test_unleash_error_is_config_error() {
    let config_error = UnleashError::config_error(ErrorCode::ConfigMissingApiKey, "Missing key");
    let network_error = UnleashError::network_error(ErrorCode::NetworkError, "Network issue");

    assert!(config_error.is_config_error());
    assert!(!network_error.is_config_error());
}

#[test]
fn test_unleash_error_is_network_error() {
    let network_error = UnleashError::network_error(ErrorCode::HttpTimeout, "Timeout");
    let config_error = UnleashError::config_error(ErrorCode::ConfigInvalidUrl, "Bad URL");

    assert!(network_error.is_network_error());
    assert!(!config_error.is_network_error());
}

#[test]
fn test_stopped_error() {
    let error = UnleashError::stopped();
    assert_eq!(error.code, ErrorCode::ClientStopped);
}

#[test]
fn test_error_display() {
    let error = UnleashError::new(ErrorCode::HttpUnauthorized, "Authentication Error: 401 - ");
    let display = format!("{}", error);

    assert!(display.contains("HTTP_UNAUTHORIZED"));
    assert!(display.contains("Authentication Error"));
}

#[test]
fn test_error_code_display() {
    assert_eq!(format!("{}", ErrorCode::ConfigInvalidUrl), "CONFIG_INVALID_URL");
}
