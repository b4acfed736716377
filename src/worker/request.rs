//! Target URL construction for a task

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::diagnostics::RelayError;
use crate::config::EndpointConfig;
use crate::messaging::Task;

/// Artificial latency requested from the endpoint when a task sets `delay`
pub const DELAY_MS: u32 = 150;

/// How query values are written into the URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryEncoding {
    /// Values are concatenated verbatim
    #[default]
    Raw,
    /// Values are percent-encoded
    Percent,
}

/// Build `<base_url><path>?from=<from>[&delay=150]`
pub fn build_url(
    endpoint: &EndpointConfig,
    task: &Task,
    encoding: QueryEncoding,
) -> Result<String, RelayError> {
    let target = format!("{}{}", endpoint.base_url.trim_end_matches('/'), endpoint.path);

    match encoding {
        QueryEncoding::Raw => {
            let delay = if task.delay {
                format!("&delay={}", DELAY_MS)
            } else {
                String::new()
            };
            Ok(format!("{}?from={}{}", target, task.from, delay))
        }
        QueryEncoding::Percent => {
            let mut url = Url::parse(&target).map_err(|e| RelayError::InvalidUrl(e.to_string()))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("from", &task.from);
                if task.delay {
                    query.append_pair("delay", &DELAY_MS.to_string());
                }
            }
            Ok(url.into())
        }
    }
}
