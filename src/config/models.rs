use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::worker::{DispatchMode, HttpConfig, QueryEncoding, ResponseShape, WorkerConfig};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
}

/// Remote endpoint the relay calls
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_path() -> String {
    "/api/greeting".to_string()
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Unset means no deadline on the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "relaybox/0.1.0".to_string()
}

/// Worker behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerSettings {
    #[serde(default)]
    pub response_shape: ResponseShape,
    #[serde(default)]
    pub dispatch: DispatchMode,
    #[serde(default)]
    pub query_encoding: QueryEncoding,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            response_shape: ResponseShape::default(),
            dispatch: DispatchMode::default(),
            query_encoding: QueryEncoding::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

impl Config {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_millis(self.http.connect_timeout_ms),
            request_timeout: self.http.request_timeout_ms.map(Duration::from_millis),
            user_agent: self.http.user_agent.clone(),
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            endpoint: self.endpoint.clone(),
            shape: self.worker.response_shape,
            dispatch: self.worker.dispatch,
            encoding: self.worker.query_encoding,
            channel_capacity: self.worker.channel_capacity,
        }
    }
}
