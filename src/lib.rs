//! Unleash proxy client
//!
//! Rust client for the Unleash proxy / frontend API. Toggles are fetched in
//! the background and served from memory; usage metrics are batched and
//! sent on a timer.
//!
//! # Quick Start
//!
//! ```no_run
//! use unleash_proxy_client::{ClientOptions, UnleashClient};
//!
//! #[tokio::main]
//! async fn main() -> unleash_proxy_client::Result<()> {
//!     let options = ClientOptions::builder("https://unleash.example.com/api", "proxy-key")
//!         .app_name("checkout")
//!         .environment("production")
//!         .build();
//!     let client = UnleashClient::new(options)?;
//!
//!     // Wait for the first fetch
//!     client.start(false).await?;
//!
//!     if client.is_enabled("new-checkout") {
//!         let variant = client.get_variant("new-checkout");
//!         println!("variant: {}", variant.name);
//!     }
//!
//!     // Refetch for a signed-in user
//!     client.update_context([("userId", "42")]).await?;
//!
//!     client.stop();
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod http;
pub mod types;
mod client;

pub use types::{EvaluationContext, Payload, Toggle, ToggleTable, Variant};

pub use error::{ErrorCode, Result, UnleashError};

pub use core::{
    ClientEvent, ClientOptions, ClientOptionsBuilder, Completion, EventKind, MetricsBucket,
    MetricsPayload, Reporter, ScheduledTask, TracingReporter,
};

pub use http::{FetchOutcome, HttpClient, MetricsSender, ToggleFetcher};

pub use client::{UnleashClient, SDK_VERSION};
