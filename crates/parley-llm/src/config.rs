// Configuration layer for provider-agnostic client creation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::gemini::GeminiClient;
use crate::openai::OpenAIClient;
use crate::traits::ChatClient;

/// Closed set of supported vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Gemini,
}

impl ProviderType {
    /// Registry key used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Gemini => "gemini",
        }
    }
}

/// Per-vendor connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub api_key: String,
    /// Override for the vendor API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl VendorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI(VendorConfig),
    Gemini(VendorConfig),
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        ProviderConfig::OpenAI(VendorConfig::new(api_key))
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        ProviderConfig::Gemini(VendorConfig::new(api_key))
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::OpenAI(_) => ProviderType::OpenAI,
            ProviderConfig::Gemini(_) => ProviderType::Gemini,
        }
    }
}

/// Credentials gathered from process configuration.
///
/// A provider whose key is absent or blank is not configured at all.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
}

impl ProviderCredentials {
    /// Provider configs for every vendor that has a usable credential
    pub fn configured(&self) -> Vec<ProviderConfig> {
        let mut configs = Vec::new();

        if let Some(key) = non_blank(&self.openai_api_key) {
            let mut vendor = VendorConfig::new(key);
            vendor.base_url = non_blank(&self.openai_base_url);
            configs.push(ProviderConfig::OpenAI(vendor));
        }
        if let Some(key) = non_blank(&self.gemini_api_key) {
            let mut vendor = VendorConfig::new(key);
            vendor.base_url = non_blank(&self.gemini_base_url);
            configs.push(ProviderConfig::Gemini(vendor));
        }

        configs
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        match config {
            ProviderConfig::OpenAI(vendor) => {
                let mut client = OpenAIClient::new(vendor.api_key)?;
                if let Some(base_url) = vendor.base_url {
                    client = client.with_base_url(base_url);
                }
                Ok(Arc::new(client))
            }
            ProviderConfig::Gemini(vendor) => {
                let mut client = GeminiClient::new(vendor.api_key)?;
                if let Some(base_url) = vendor.base_url {
                    client = client.with_base_url(base_url);
                }
                Ok(Arc::new(client))
            }
        }
    }
}
