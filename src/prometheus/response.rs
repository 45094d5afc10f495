//! Prometheus query API response format

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Envelope of every `/api/v1/query` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn into_data(self) -> Result<QueryData> {
        match (self.status.as_str(), self.data) {
            ("success", Some(data)) => Ok(data),
            _ => Err(Error::Prometheus {
                error_type: self.error_type.unwrap_or_else(|| self.status.clone()),
                message: self.error.unwrap_or_else(|| "no data in response".to_string()),
            }),
        }
    }
}

/// `(timestamp, value)` as encoded by Prometheus; the value is a string
pub type SamplePair = (f64, String);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum QueryData {
    Vector(Vec<VectorSample>),
    Matrix(Vec<MatrixSeries>),
    Scalar(SamplePair),
    String(SamplePair),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorSample {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: SamplePair,
}

impl VectorSample {
    /// Numeric value, `None` for NaN/Inf or unparsable values
    pub fn number(&self) -> Option<f64> {
        self.value.1.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatrixSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<SamplePair>,
}
