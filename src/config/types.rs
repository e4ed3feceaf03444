use std::time::Duration;

use serde::Deserialize;

use crate::args::{OutputFormat, parse_duration};
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "target_url")]
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Vec<String>>,
    #[serde(alias = "data")]
    pub body: Option<String>,
    #[serde(alias = "workers")]
    pub concurrency: Option<usize>,
    pub duration: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub disable_keepalive: Option<bool>,
    pub verify_tls: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub export_json: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}
