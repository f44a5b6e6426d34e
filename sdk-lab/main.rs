//! Unleash proxy client lab
//!
//! Verification script against a live proxy.
//! Run with: UNLEASH_URL=... UNLEASH_CLIENT_KEY=... cargo run --example sdk-lab

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use unleash_proxy_client::{ClientOptions, EventKind, UnleashClient};

const PASS: &str = "\x1b[32m[PASS]\x1b[0m";
const FAIL: &str = "\x1b[31m[FAIL]\x1b[0m";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("unleash_proxy_client=debug")),
        )
        .init();

    println!("=== Unleash Proxy Client Lab ===\n");

    let url = std::env::var("UNLEASH_URL")
        .unwrap_or_else(|_| "http://localhost:3063/proxy".to_string());
    let key = std::env::var("UNLEASH_CLIENT_KEY").unwrap_or_else(|_| "proxy-client-key".to_string());

    let mut passed = 0;
    let mut failed = 0;

    macro_rules! pass {
        ($test:expr) => {{
            println!("{} {}", PASS, $test);
            passed += 1;
        }};
    }

    macro_rules! fail {
        ($test:expr) => {{
            println!("{} {}", FAIL, $test);
            failed += 1;
        }};
    }

    println!("Testing construction...");
    let options = ClientOptions::builder(url.as_str(), key)
        .flags_path("")
        .app_name("sdk-lab")
        .environment("development")
        .refresh_interval(Duration::from_secs(5))
        .metrics_interval(Duration::from_secs(5))
        .timeout(Duration::from_secs(3))
        .build();

    let client = match UnleashClient::new(options) {
        Ok(c) => c,
        Err(e) => {
            fail!(format!("Construction - {}", e));
            print_summary(passed, failed);
            std::process::exit(1);
        }
    };
    pass!("Construction");

    let updates = Arc::new(AtomicU32::new(0));
    let updates_clone = Arc::clone(&updates);
    client.subscribe(EventKind::Update, move |_| {
        updates_clone.fetch_add(1, Ordering::SeqCst);
    });

    println!("\nTesting first fetch against {}...", url);
    match client.start(true).await {
        Ok(()) => pass!(format!("First fetch ({} toggles)", client.all_toggles().len())),
        Err(e) => fail!(format!("First fetch - {}", e)),
    }

    if updates.load(Ordering::SeqCst) > 0 || client.all_toggles().is_empty() {
        pass!("Update event");
    } else {
        fail!("Update event - not emitted for a non-empty table");
    }

    println!("\nTesting evaluation...");
    let mut names: Vec<String> = client.all_toggles().keys().cloned().collect();
    names.sort();
    for name in names.iter().take(5) {
        let variant = client.get_variant(name);
        println!(
            "  {} enabled={} variant={}",
            name,
            client.is_enabled(name),
            variant.name
        );
    }

    if !client.is_enabled("sdk-lab-missing-flag")
        && client.get_variant("sdk-lab-missing-flag").is_disabled_sentinel()
    {
        pass!("Unknown flag is disabled");
    } else {
        fail!("Unknown flag - expected disabled");
    }

    println!("\nTesting context update...");
    match client.update_context([("userId", "lab-user-123")]).await {
        Ok(()) if client.context().get("appName") == Some("sdk-lab") => pass!("update_context()"),
        Ok(()) => fail!("update_context() - appName lost"),
        Err(e) => fail!(format!("update_context() - {}", e)),
    }

    println!("\nTesting metrics...");
    tokio::time::sleep(Duration::from_millis(200)).await;
    client.get_variant("sdk-lab-missing-flag");
    match client.flush_metrics() {
        Some(send) => {
            let _ = send.await;
            pass!("flush_metrics()");
        }
        None => fail!("flush_metrics() - metrics not collecting"),
    }

    println!("\nTesting cleanup...");
    client.stop();
    client.stop();
    if client.is_running() {
        fail!("stop() - still running");
    } else {
        pass!("stop()");
    }

    print_summary(passed, failed);

    if failed > 0 {
        println!("\n\x1b[31mSome verifications failed!\x1b[0m");
        std::process::exit(1);
    } else {
        println!("\n\x1b[32mAll verifications passed!\x1b[0m");
        std::process::exit(0);
    }
}

fn print_summary(passed: i32, failed: i32) {
    println!("\n{}", "=".repeat(40));
    println!("Results: {} passed, {} failed", passed, failed);
    println!("{}", "=".repeat(40));
}
