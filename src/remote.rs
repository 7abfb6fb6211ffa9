use std::time::Duration;

use crate::error::{ConfigError, DocumentError, Notices};
use crate::tweaks::Configuration;

/// One blocking GET of the published tweak document.
pub fn try_fetch(url: &str, timeout: Duration) -> Result<Configuration, ConfigError> {
    let fetch_err = |source| ConfigError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(fetch_err)?;

    let response = client.get(url).send().map_err(fetch_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ConfigError::FetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().map_err(fetch_err)?;
    match Configuration::parse(&body) {
        Ok(Some(document)) => Ok(document),
        Ok(None) => Err(ConfigError::FetchParse {
            url: url.to_string(),
            source: DocumentError::Invalid("empty body".to_string()),
        }),
        Err(source) => Err(ConfigError::FetchParse {
            url: url.to_string(),
            source,
        }),
    }
}

/// Fetches the remote document; any failure is recorded and reads as "absent".
pub fn fetch(url: &str, timeout: Duration, notices: &mut Notices) -> Option<Configuration> {
    tracing::debug!(url, ?timeout, "fetching remote configuration");
    match try_fetch(url, timeout) {
        Ok(document) => {
            tracing::info!(url, features = document.tweaks.len(), "fetched remote configuration");
            Some(document)
        }
        Err(e) => {
            notices.push(e);
            None
        }
    }
}
