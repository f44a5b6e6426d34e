use chrono::{TimeZone, Utc};
use std::time::Duration;
use unleash_proxy_client::{
    ClientOptions, ErrorCode, EvaluationContext, FetchOutcome, HttpClient, MetricsBucket,
    MetricsPayload, MetricsSender, ToggleFetcher,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn toggles_body() -> serde_json::Value {
    serde_json::json!({
        "toggles": [
            {"name": "A", "enabled": true, "variant": {"name": "blue", "enabled": true}},
            {"name": "B", "enabled": false, "variant": {"name": "disabled", "enabled": false}}
        ]
    })
}

fn http_client(server: &MockServer) -> HttpClient {
    HttpClient::new(&ClientOptions::new(server.uri(), "proxy-key")).unwrap()
}

#[tokio::test]
async fn test_fetch_sends_headers_and_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(header("Authorization", "proxy-key"))
        .and(header("Accept", "application/json"))
        .and(header("Cache", "no-cache"))
        .and(query_param("appName", "X"))
        .and(query_param("userId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(toggles_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let context = EvaluationContext::new(Some("X".to_string()), None).property("userId", "42");
    let outcome = http_client(&mock_server)
        .fetch_toggles(&context, None)
        .await
        .unwrap();

    match outcome {
        FetchOutcome::Updated { toggles, etag } => {
            assert_eq!(toggles.len(), 2);
            assert_eq!(toggles[0].name, "A");
            assert_eq!(toggles[0].variant.name, "blue");
            assert!(etag.is_none());
        }
        FetchOutcome::NotModified => panic!("expected a toggle set"),
    }
}

#[tokio::test]
async fn test_fetch_returns_etag_and_honours_304() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(toggles_body()),
        )
        .mount(&mock_server)
        .await;

    let client = http_client(&mock_server);
    let context = EvaluationContext::default();

    let first = client.fetch_toggles(&context, None).await.unwrap();
    let etag = match first {
        FetchOutcome::Updated { etag, .. } => etag,
        FetchOutcome::NotModified => None,
    };
    assert_eq!(etag.as_deref(), Some("\"v1\""));

    let second = client.fetch_toggles(&context, etag.as_deref()).await.unwrap();
    assert_eq!(second, FetchOutcome::NotModified);
}

#[tokio::test]
async fn test_fetch_maps_status_codes() {
    let cases = [
        (401, ErrorCode::HttpUnauthorized),
        (403, ErrorCode::HttpForbidden),
        (404, ErrorCode::HttpNotFound),
        (429, ErrorCode::HttpRateLimited),
        (503, ErrorCode::HttpServerError),
    ];

    for (status, code) in cases {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let err = http_client(&mock_server)
            .fetch_toggles(&EvaluationContext::default(), None)
            .await
            .unwrap_err();

        assert_eq!(err.code, code, "status {}", status);
        assert!(err.message.contains(&status.to_string()));
        assert!(err.message.contains("nope"));
    }
}

#[tokio::test]
async fn test_fetch_rejects_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = http_client(&mock_server)
        .fetch_toggles(&EvaluationContext::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::HttpInvalidResponse);
}

#[tokio::test]
async fn test_fetch_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(toggles_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let options = ClientOptions::builder(mock_server.uri(), "proxy-key")
        .timeout(Duration::from_millis(100))
        .build();
    let err = HttpClient::new(&options)
        .unwrap()
        .fetch_toggles(&EvaluationContext::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::HttpTimeout);
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_fetch_with_invalid_url() {
    let client = HttpClient::new(&ClientOptions::new("not a url", "proxy-key")).unwrap();

    let err = client
        .fetch_toggles(&EvaluationContext::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ConfigInvalidUrl);
}

#[tokio::test]
async fn test_send_metrics_posts_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/client/metrics"))
        .and(header("Authorization", "proxy-key"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut bucket = MetricsBucket::open(Utc.with_ymd_and_hms(2023, 3, 22, 10, 15, 15).unwrap());
    bucket.record("A", true);
    bucket.record("A", true);
    bucket.record("A", false);
    bucket.close(Utc.with_ymd_and_hms(2023, 3, 22, 10, 15, 30).unwrap());
    let payload = MetricsPayload {
        app_name: "X".to_string(),
        instance_id: "i-1".to_string(),
        bucket,
    };

    http_client(&mock_server).send_metrics(&payload).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "appName": "X",
            "instanceId": "i-1",
            "bucket": {
                "start": "2023-03-22T10:15:15+0000",
                "end": "2023-03-22T10:15:30+0000",
                "toggles": {"A": {"yes": 2, "no": 1}}
            }
        })
    );
}

#[tokio::test]
async fn test_send_metrics_failure_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let payload = MetricsPayload {
        app_name: "X".to_string(),
        instance_id: "i-1".to_string(),
        bucket: MetricsBucket::open(Utc::now()),
    };
    let err = http_client(&mock_server)
        .send_metrics(&payload)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::HttpServerError);
}
