use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Context key always sent with the application name.
pub const APP_NAME_KEY: &str = "appName";

/// Context key always sent with the environment.
pub const ENVIRONMENT_KEY: &str = "environment";

/// Name of the variant handed out for unknown or disabled toggles.
pub const DISABLED_VARIANT_NAME: &str = "disabled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub value: String,
}

impl Payload {
    pub fn new(payload_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            payload_type: payload_type.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Variant {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            payload: None,
        }
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The variant returned for toggles that are absent from the current table.
    pub fn disabled() -> Self {
        Self::new(DISABLED_VARIANT_NAME, false)
    }

    pub fn is_disabled_sentinel(&self) -> bool {
        self == &Self::disabled()
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub variant: Variant,
}

impl Toggle {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            variant: Variant::disabled(),
        }
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }
}

/// Body of the flags endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureResponse {
    pub toggles: Vec<Toggle>,
}

/// Flag name to toggle, as last fetched.
pub type ToggleTable = HashMap<String, Toggle>;

/// Key/value context sent with every flags request.
///
/// `appName` and `environment` are always present as slots, possibly empty.
/// Everything else lives in `properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    pub app_name: Option<String>,
    pub environment: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl EvaluationContext {
    pub fn new(app_name: Option<String>, environment: Option<String>) -> Self {
        Self {
            app_name,
            environment,
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a key. The reserved keys land in their dedicated slots.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            APP_NAME_KEY => self.app_name = Some(value),
            ENVIRONMENT_KEY => self.environment = Some(value),
            _ => {
                self.properties.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            APP_NAME_KEY => self.app_name.as_deref(),
            ENVIRONMENT_KEY => self.environment.as_deref(),
            _ => self.properties.get(key).map(String::as_str),
        }
    }

    /// Keep only `appName` and `environment`, then overlay `fragment`.
    pub fn rebase<I, K, V>(&self, fragment: I) -> EvaluationContext
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = EvaluationContext::new(self.app_name.clone(), self.environment.clone());
        for (key, value) in fragment {
            merged.set(key, value);
        }
        merged
    }

    /// Query parameters for the flags request. Empty slots are left out.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.properties.len() + 2);
        if let Some(ref app_name) = self.app_name {
            pairs.push((APP_NAME_KEY.to_string(), app_name.clone()));
        }
        if let Some(ref environment) = self.environment {
            pairs.push((ENVIRONMENT_KEY.to_string(), environment.clone()));
        }
        pairs.extend(self.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }

    pub fn to_map(&self) -> HashMap<String, Option<String>> {
        let mut map: HashMap<String, Option<String>> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect();
        map.insert(APP_NAME_KEY.to_string(), self.app_name.clone());
        map.insert(ENVIRONMENT_KEY.to_string(), self.environment.clone());
        map
    }
}
