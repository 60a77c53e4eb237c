//! Edge cache invalidation.

use std::time::Duration;

use serde::Serialize;

use webdeploy_core::PurgeConfig;

use crate::error::PurgeError;

/// Something that can invalidate cached copies of the deployed content.
pub trait CachePurger {
    fn purge(&self, paths: &[String]) -> Result<(), PurgeError>;
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PurgeRequest<'a> {
    pub content_paths: &'a [String],
}

/// Purges by POSTing `{"contentPaths": [...]}` to an HTTP endpoint.
pub struct HttpPurger {
    url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpPurger {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            url: url.into(),
            token,
            agent,
        }
    }

    /// Build from config, reading the bearer token from the configured env var.
    pub fn from_config(config: &PurgeConfig) -> Self {
        Self::new(config.url.clone(), config.token())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CachePurger for HttpPurger {
    fn purge(&self, paths: &[String]) -> Result<(), PurgeError> {
        let mut request = self.agent.post(&self.url);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let body = PurgeRequest {
            content_paths: paths,
        };
        match request.send_json(&body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, response)) => Err(PurgeError::Http {
                url: self.url.clone(),
                message: format!("HTTP {code} {}", response.status_text()),
            }),
            Err(err) => Err(PurgeError::Http {
                url: self.url.clone(),
                message: err.to_string(),
            }),
        }
    }
}
