use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ClientFactory, ProviderCredentials};
use crate::traits::ChatClient;

/// Public description of a registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub name: String,
    pub display_name: String,
    pub models: Vec<String>,
}

struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    client: Arc<dyn ChatClient>,
}

/// Immutable mapping from provider name to its live client.
///
/// Built once at startup and shared behind an `Arc`; there is no way to
/// add or remove providers afterwards.
pub struct ProviderRegistry {
    providers: BTreeMap<String, RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Registry with no providers
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Build from credentials; providers without a credential are left out
    pub fn from_credentials(credentials: &ProviderCredentials) -> Result<Self> {
        let mut builder = Self::builder();
        for config in credentials.configured() {
            let client = ClientFactory::create_client(config)?;
            tracing::info!(provider = client.provider(), "Registered provider");
            builder = builder.register(client);
        }
        Ok(builder.build())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ChatClient>> {
        self.providers.get(name).map(|p| Arc::clone(&p.client))
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(name).map(|p| &p.descriptor)
    }

    pub fn descriptors(&self) -> BTreeMap<String, ProviderDescriptor> {
        self.providers
            .iter()
            .map(|(name, p)| (name.clone(), p.descriptor.clone()))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: BTreeMap<String, RegisteredProvider>,
}

impl ProviderRegistryBuilder {
    /// Register a client under its own provider name (last one wins)
    pub fn register(mut self, client: Arc<dyn ChatClient>) -> Self {
        let descriptor = ProviderDescriptor {
            name: client.provider().to_string(),
            display_name: client.display_name().to_string(),
            models: client.models(),
        };
        self.providers.insert(
            descriptor.name.clone(),
            RegisteredProvider { descriptor, client },
        );
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}
