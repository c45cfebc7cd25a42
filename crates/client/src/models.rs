use serde::Deserialize;

use crate::{AnthropicClient, Endpoint, Result};

/// One entry of the model listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
	pub id: String,
	#[serde(default)]
	pub display_name: String,
	#[serde(default)]
	pub created_at: String,
}

/// `GET /v1/models` page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelsResponse {
	pub data: Vec<ModelInfo>,
	#[serde(default)]
	pub has_more: bool,
	#[serde(default)]
	pub first_id: Option<String>,
	#[serde(default)]
	pub last_id: Option<String>,
}

impl AnthropicClient {
	/// Lists the models available to the configured key.
	pub async fn list_models(&self, endpoint: &Endpoint) -> Result<ModelsResponse> {
		let builder = self.request(reqwest::Method::GET, endpoint, "v1/models")?;
		let response = Self::send(builder).await?;
		let models: ModelsResponse = response.json().await?;
		tracing::debug!(count = models.data.len(), has_more = models.has_more, "client.models");
		Ok(models)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn decodes_listing_page() {
		let page: ModelsResponse = serde_json::from_str(
			r#"{"data":[{"type":"model","id":"claude-3-5-haiku-20241022","display_name":"Claude 3.5 Haiku","created_at":"2024-10-22T00:00:00Z"}],"has_more":false,"first_id":"claude-3-5-haiku-20241022","last_id":"claude-3-5-haiku-20241022"}"#,
		)
		.unwrap();
		assert_eq!(page.data.len(), 1);
		assert_eq!(page.data[0].display_name, "Claude 3.5 Haiku");
		assert_eq!(page.last_id.as_deref(), Some("claude-3-5-haiku-20241022"));
	}

	#[tokio::test]
	async fn listing_requires_a_key() {
		let client = AnthropicClient::new().unwrap();
		let err = client.list_models(&Endpoint::new("http://127.0.0.1:9", "")).await.unwrap_err();
		assert!(matches!(err, crate::ClientError::MissingCredentials));
	}
}
