//! Boundary to the ring-size recommendation service.
//!
//! The service receives the finger width in centimeters plus a size-guide
//! image and answers with a size label (`talla`) and a qualitative tier
//! (`probabilidad`). Failures here are reported on their own and never touch
//! the measurement they were asked about.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::measurement::Measurement;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub finger_width_cm: f64,
    /// Size-guide image, already base64 encoded by the caller.
    pub reference_image_base64: String,
}

impl RecommendationRequest {
    pub fn new(measurement: &Measurement, reference_image_base64: &str) -> RecommendationRequest {
        RecommendationRequest {
            finger_width_cm: measurement.finger_width_cm(),
            reference_image_base64: reference_image_base64.to_string(),
        }
    }

    pub fn finger_circumference_mm(&self) -> f64 {
        self.finger_width_cm * PI * 10.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    Alta,
    Media,
    Baja,
}

/// Tier for the gap between the finger and the chosen size-guide row.
pub fn tier_for_difference(difference_mm: f64) -> ConfidenceTier {
    let d = difference_mm.abs();
    if d < 1.0 {
        ConfidenceTier::Alta
    } else if d <= 3.0 {
        ConfidenceTier::Media
    } else {
        ConfidenceTier::Baja
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub talla: String,
    pub probabilidad: ConfidenceTier,
}

pub trait SizeRecommender {
    fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation>;
}

fn service_error(msg: impl Into<String>) -> Error {
    Error::RecommendationService(msg.into())
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses a service answer.
///
/// Accepts the bare `{talla, probabilidad}` object and the
/// `{"recommendation": "<json text>"}` envelope whose text may sit inside a
/// markdown code fence. `{"error": ...}`, non-JSON and malformed bodies are
/// errors.
pub fn parse_recommendation(body: &str) -> Result<Recommendation> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(body))
        .map_err(|e| service_error(format!("response is not JSON: {e}")))?;
    if let Some(err) = value.get("error") {
        let msg = err.as_str().map_or_else(|| err.to_string(), str::to_string);
        return Err(service_error(msg));
    }
    match value.get("recommendation") {
        Some(serde_json::Value::String(text)) => parse_recommendation(text),
        Some(inner) => serde_json::from_value(inner.clone())
            .map_err(|e| service_error(format!("malformed recommendation: {e}"))),
        None => serde_json::from_value(value)
            .map_err(|e| service_error(format!("malformed recommendation: {e}"))),
    }
}

/// Carries a JSON request body to the service and returns the raw answer.
pub trait Transport {
    fn post_json(&self, body: &str) -> std::result::Result<String, String>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> std::result::Result<String, String>,
{
    fn post_json(&self, body: &str) -> std::result::Result<String, String> {
        self(body)
    }
}

pub struct RemoteRecommender<T: Transport> {
    transport: T,
}

impl<T: Transport> RemoteRecommender<T> {
    pub fn new(transport: T) -> RemoteRecommender<T> {
        RemoteRecommender { transport }
    }
}

impl<T: Transport> SizeRecommender for RemoteRecommender<T> {
    fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        let body = serde_json::to_string(request)?;
        let answer = self.transport.post_json(&body).map_err(service_error)?;
        debug!("recommendation service answered {} bytes", answer.len());
        parse_recommendation(&answer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeGuideRow {
    pub label: String,
    pub circumference_mm: f64,
}

/// Local size table: nearest circumference wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeGuide {
    pub rows: Vec<SizeGuideRow>,
}

impl SizeRecommender for SizeGuide {
    fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        let circumference = request.finger_circumference_mm();
        let row = self
            .rows
            .iter()
            .min_by(|a, b| {
                (a.circumference_mm - circumference)
                    .abs()
                    .total_cmp(&(b.circumference_mm - circumference).abs())
            })
            .ok_or_else(|| service_error("size guide has no rows"))?;
        Ok(Recommendation {
            talla: row.label.clone(),
            probabilidad: tier_for_difference(row.circumference_mm - circumference),
        })
    }
}
