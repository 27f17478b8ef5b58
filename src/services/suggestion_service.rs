//! SuggestionClient — opaque call to an external text-generation endpoint
//! that enriches a new booking with a travel suggestion.
//!
//! This client never surfaces a failure: any network, HTTP, or decoding
//! problem is logged and replaced with a fixed apology string. No timeout
//! or retry is applied; a hang stalls only the request that awaited it.

use crate::models::provider::Provider;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Returned whenever the generation call fails for any reason.
pub const FALLBACK_SUGGESTION: &str =
    "Sorry, we could not generate travel suggestions at the moment.";

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
struct GenerationChoice {
    generated_text: String,
}

/// HTTP client for the generation endpoint.
#[derive(Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl SuggestionClient {
    pub fn new(api_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_token,
        }
    }

    /// Generate a travel suggestion for the provider's location.
    ///
    /// Infallible by design: failures degrade to [`FALLBACK_SUGGESTION`].
    pub async fn suggest(&self, provider: &Provider) -> String {
        match self.fetch(provider).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("travel suggestion request failed: {:#}", err);
                FALLBACK_SUGGESTION.to_string()
            }
        }
    }

    async fn fetch(&self, provider: &Provider) -> Result<String> {
        let prompt = format!(
            "Suggest a travel destination based on the following provider location: {}, {}",
            provider.province, provider.region
        );

        let mut request = self
            .http
            .post(&self.api_url)
            .json(&GenerationRequest { inputs: &prompt });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let choices: Vec<GenerationChoice> = request
            .send()
            .await
            .context("sending generation request")?
            .error_for_status()
            .context("generation endpoint returned an error status")?
            .json()
            .await
            .context("decoding generation response")?;

        choices
            .into_iter()
            .next()
            .map(|choice| choice.generated_text)
            .context("generation response contained no choices")
    }
}
