//! Metrics buckets and the payload sent to the metrics endpoint.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `yyyy-MM-dd'T'HH:mm:ssZ`, e.g. `2023-03-22T10:15:30+0000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Evaluation counts for one flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagMetric {
    pub yes: u64,
    pub no: u64,
}

impl FlagMetric {
    pub fn record(&mut self, enabled: bool) {
        if enabled {
            self.yes += 1;
        } else {
            self.no += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.yes + self.no
    }
}

/// Counts collected over one flush window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsBucket {
    #[serde(with = "wire_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(
        default,
        with = "wire_timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub toggles: HashMap<String, FlagMetric>,
}

impl MetricsBucket {
    /// Open an empty bucket. The wire format has second precision, so the
    /// start is truncated to match.
    pub fn open(start: DateTime<Utc>) -> Self {
        Self {
            start: start.trunc_subsecs(0),
            end: None,
            toggles: HashMap::new(),
        }
    }

    pub fn record(&mut self, flag_name: &str, enabled: bool) {
        match self.toggles.get_mut(flag_name) {
            Some(metric) => metric.record(enabled),
            None => self
                .toggles
                .entry(flag_name.to_string())
                .or_default()
                .record(enabled),
        }
    }

    pub fn close(&mut self, end: DateTime<Utc>) {
        self.end = Some(end.trunc_subsecs(0));
    }

    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }

    pub fn get(&self, flag_name: &str) -> Option<FlagMetric> {
        self.toggles.get(flag_name).copied()
    }
}

/// Body of the metrics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPayload {
    pub app_name: String,
    pub instance_id: String,
    pub bucket: MetricsBucket,
}

/// Serde adapter for [`TIMESTAMP_FORMAT`].
///
/// Parsing also accepts RFC 3339, which is what the server itself emits.
pub mod wire_timestamp {
    use chrono::{DateTime, ParseError, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, ParseError> {
        DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|ts| ts.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
