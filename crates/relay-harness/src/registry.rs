use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::HarnessError;
use crate::model::ProviderId;
use crate::provider::Provider;
use crate::vendors::claude::ClaudeProvider;
use crate::vendors::codex::CodexProvider;

/// Name-indexed set of providers the front-end can switch between.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    by_id: HashMap<ProviderId, usize>,
}

impl ProviderRegistry {
    /// Starts a builder for registering providers.
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Registry with the Claude and Codex providers, configured from the
    /// environment.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::builder()
            .register(Arc::new(ClaudeProvider::from_env()?))
            .register(Arc::new(CodexProvider::from_env()?))
            .build()
    }

    /// Looks up a provider by name.
    pub fn get(&self, id: &str) -> Result<Arc<dyn Provider>, HarnessError> {
        self.by_id
            .get(&ProviderId::new(id))
            .map(|&index| self.providers[index].clone())
            .ok_or_else(|| HarnessError::ProviderNotFound {
                provider: ProviderId::new(id),
            })
    }

    /// Registered providers in registration order.
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }
}

/// Builder used to register providers before creating a [`ProviderRegistry`].
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistryBuilder {
    /// Registers a provider. Names must be unique.
    pub fn register(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Builds the registry and validates registration (including duplicates).
    pub fn build(self) -> Result<ProviderRegistry, HarnessError> {
        let mut by_id = HashMap::with_capacity(self.providers.len());
        for (index, provider) in self.providers.iter().enumerate() {
            let id = provider.id();
            if by_id.insert(id.clone(), index).is_some() {
                return Err(HarnessError::Config(format!(
                    "duplicate provider registration: {id}"
                )));
            }
        }
        Ok(ProviderRegistry {
            providers: self.providers,
            by_id,
        })
    }
}
