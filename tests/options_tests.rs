use std::time::Duration;
use unleash_proxy_client::{ClientOptions, ErrorCode};

#[test]
fn test_default_values() {
    let options = ClientOptions::new("https://unleash.example.com/api", "proxy-key");

    assert_eq!(options.url, "https://unleash.example.com/api");
    assert_eq!(options.api_key, "proxy-key");
    assert!(options.app_name.is_none());
    assert!(options.environment.is_none());
    assert_eq!(options.instance_id, "rustApp");
    assert_eq!(options.refresh_interval, Duration::from_secs(15));
    assert_eq!(options.metrics_interval, Duration::from_secs(15));
    assert!(options.metrics_enabled);
    assert_eq!(options.flags_path, "/proxy");
    assert_eq!(options.metrics_path, "/client/metrics");
    assert!(options.timeout.is_none());
}

#[test]
fn test_builder_custom_values() {
    let options = ClientOptions::builder("https://unleash.example.com/api", "proxy-key")
        .app_name("checkout")
        .environment("production")
        .instance_id("pod-7")
        .refresh_interval(Duration::from_secs(30))
        .metrics_interval(Duration::from_secs(60))
        .metrics_enabled(false)
        .flags_path("/frontend")
        .metrics_path("/frontend/client/metrics")
        .timeout(Duration::from_secs(5))
        .build();

    assert_eq!(options.app_name.as_deref(), Some("checkout"));
    assert_eq!(options.environment.as_deref(), Some("production"));
    assert_eq!(options.instance_id, "pod-7");
    assert_eq!(options.refresh_interval, Duration::from_secs(30));
    assert_eq!(options.metrics_interval, Duration::from_secs(60));
    assert!(!options.metrics_enabled);
    assert_eq!(options.flags_path, "/frontend");
    assert_eq!(options.metrics_path, "/frontend/client/metrics");
    assert_eq!(options.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_metrics_app_name_falls_back_to_default() {
    let unnamed = ClientOptions::new("http://localhost:4242", "proxy-key");
    let named = ClientOptions::builder("http://localhost:4242", "proxy-key")
        .app_name("checkout")
        .build();

    assert_eq!(unnamed.metrics_app_name(), "rustApp");
    assert_eq!(named.metrics_app_name(), "checkout");
}

#[test]
fn test_validate_ok() {
    let options = ClientOptions::new("http://localhost:4242", "proxy-key");
    assert!(options.validate().is_ok());
}

#[test]
fn test_validate_empty_api_key() {
    let options = ClientOptions::new("http://localhost:4242", "");
    let error = options.validate().unwrap_err();

    assert_eq!(error.code, ErrorCode::ConfigMissingApiKey);
    assert!(error.is_config_error());
}

#[test]
fn test_validate_zero_refresh_interval() {
    let options = ClientOptions::builder("http://localhost:4242", "proxy-key")
        .refresh_interval(Duration::ZERO)
        .build();

    assert_eq!(options.validate().unwrap_err().code, ErrorCode::ConfigInvalidInterval);
}

#[test]
fn test_validate_zero_metrics_interval() {
    let options = ClientOptions::builder("http://localhost:4242", "proxy-key")
        .metrics_interval(Duration::ZERO)
        .build();

    assert_eq!(options.validate().unwrap_err().code, ErrorCode::ConfigInvalidInterval);
}

#[test]
fn test_validate_zero_timeout() {
    let options = ClientOptions::builder("http://localhost:4242", "proxy-key")
        .timeout(Duration::ZERO)
        .build();

    assert_eq!(options.validate().unwrap_err().code, ErrorCode::ConfigInvalidTimeout);
}

#[test]
fn test_validate_ignores_bad_url() {
    let options = ClientOptions::new("::not a url::", "proxy-key");
    assert!(options.validate().is_ok());
}

#[test]
fn test_options_debug() {
    let options = ClientOptions::new("http://localhost:4242", "proxy-key");
    let debug_str = format!("{:?}", options);

    assert!(debug_str.contains("ClientOptions"));
    assert!(debug_str.contains("localhost:4242"));
}
