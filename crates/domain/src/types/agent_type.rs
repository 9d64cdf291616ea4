//! Credential records describing one upstream agent type

use std::fmt;

use serde::{Deserialize, Serialize};

/// One credential-scoped upstream source.
///
/// Built once from a decoded directory entry and never mutated; identity is
/// the `name`. The token is a bearer credential and is redacted from `Debug`
/// output so records can be logged freely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentType {
    pub name: String,
    /// `host[:port]` of the upstream API, without scheme.
    pub endpoint: String,
    pub token: String,
}

impl AgentType {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), endpoint: endpoint.into(), token: token.into() }
    }
}

impl fmt::Debug for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentType")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}
