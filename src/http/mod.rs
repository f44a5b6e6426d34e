mod client;
mod transport;

pub use client::{endpoint_url, HttpClient};
pub use transport::{FetchOutcome, MetricsSender, ToggleFetcher};
