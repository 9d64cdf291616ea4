//! Single-tenant credential directory

use agentmetrics_core::{CredentialDirectory, RecordResolver};
use agentmetrics_domain::{AdapterError, AgentType, Result, SingleTenantConfig};
use async_trait::async_trait;

/// Directory holding exactly one record, built from configuration.
///
/// Listing ignores the selector and always yields the one name.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    record: AgentType,
}

impl StaticDirectory {
    pub fn new(record: AgentType) -> Self {
        Self { record }
    }

    /// # Errors
    /// Returns `AdapterError::Config` if the endpoint or token is blank.
    pub fn from_config(config: &SingleTenantConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() || config.token.trim().is_empty() {
            return Err(AdapterError::Config(
                "single-tenant endpoint and token must not be empty".into(),
            ));
        }
        Ok(Self::new(AgentType::new(&config.agent_type, &config.endpoint, &config.token)))
    }
}

#[async_trait]
impl CredentialDirectory for StaticDirectory {
    async fn list_record_names(&self, _label_selector: &str) -> Result<Vec<String>> {
        Ok(vec![self.record.name.clone()])
    }

    async fn get_record(&self, name: &str) -> Result<AgentType> {
        if name == self.record.name {
            return Ok(self.record.clone());
        }
        Err(AdapterError::DirectoryUnavailable(format!("unknown agent type '{name}'")))
    }
}

#[async_trait]
impl RecordResolver for StaticDirectory {
    async fn resolve(&self, name: &str) -> Result<AgentType> {
        self.get_record(name).await
    }
}
