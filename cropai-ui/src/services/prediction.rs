//! Prediction client
//!
//! Sends the image to the hosted classification function and returns its
//! ranked labels.
//!
//! # API Reference
//! - Endpoint: `{api_url}/functions/v1/analyze-crop`
//! - Request: multipart body, image under field `image`,
//!   `Authorization: Bearer <public key>`
//! - Response: `{ "predictions": [ { "disease": "...", "confidence": 92.5 } ] }`
//!
//! Any non-2xx status or malformed body is a failure. No retry and no
//! client-side timeout are configured here.

use super::{http, ImageUpload, PredictionService};
use async_trait::async_trait;
use cropai_common::config::BackendConfig;
use cropai_common::models::{Prediction, PredictionResponse};
use cropai_common::Result;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

/// Multipart field name the function reads the image from
pub const IMAGE_FIELD: &str = "image";

/// HTTP client for the classification function
pub struct HttpPredictionClient {
    http_client: Client,
    endpoint: String,
    anon_key: String,
}

impl HttpPredictionClient {
    pub fn new(http_client: Client, backend: &BackendConfig) -> Self {
        Self {
            http_client,
            endpoint: backend.prediction_url(),
            anon_key: backend.anon_key.clone(),
        }
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, image: &ImageUpload) -> Result<Vec<Prediction>> {
        debug!(
            "Submitting {} ({} bytes, {}) for prediction",
            image.file_name,
            image.bytes.len(),
            image.content_type
        );

        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.anon_key)
            .multipart(form)
            .send()
            .await?;

        let body: PredictionResponse = http::decode_json(response).await?;
        debug!("Prediction service returned {} labels", body.predictions.len());
        Ok(body.predictions)
    }
}
