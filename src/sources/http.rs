use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::{env, fs};
use tracing::debug;

use crate::config::sources::{GenericSourceValue, HttpSourceConfig};
use crate::session::token::TokenId;
use crate::sources::FetchToken;

#[derive(Debug, Clone)]
pub struct HttpSource {
    pub cfg: HttpSourceConfig,
    pub client: Client,
}

impl HttpSource {
    pub fn new(cfg: HttpSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { cfg, client })
    }
}

impl FetchToken for HttpSource {
    async fn fetch_token(&self) -> Result<TokenId> {
        let mut request = self.client.request(self.cfg.method.clone(), &self.cfg.url);

        // Build headers dynamically
        if let Some(headers) = &self.cfg.headers {
            for (key, v) in headers {
                let value = prepare_generic_source_value(v)?;
                request = request.header(key, value);
            }
        }

        debug!("requesting session token from {}", self.cfg.url);
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("HTTP request failed: {}", response.status()));
        }
        let body = response.text().await?;
        extract_token_id(&body, self.cfg.token_field.as_deref())
    }
}

fn prepare_generic_source_value(value: &GenericSourceValue) -> Result<String> {
    match value {
        GenericSourceValue::Literal { value } => Ok(value.to_owned()),
        GenericSourceValue::FromEnv { from_env } => {
            env::var(from_env).with_context(|| format!("env var '{}' is not set", from_env))
        }
        GenericSourceValue::FromFile { path } => fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path))
            .map(|res| res.trim().to_string()),
    }
}

/// Pull the token id out of a response body.
///
/// `field` starting with '/' is a JSON pointer, anything else a top-level key;
/// no field means the body itself is the id.
pub fn extract_token_id(body: &str, field: Option<&str>) -> Result<TokenId> {
    let raw = match field {
        None => body.trim().to_owned(),
        Some(field) => {
            let json: Value = serde_json::from_str(body).context("response body is not JSON")?;
            let found = if field.starts_with('/') {
                json.pointer(field)
            } else {
                json.get(field)
            };
            found
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| anyhow!("field '{}' is absent or not a string", field))?
        }
    };
    raw.parse::<TokenId>()
        .with_context(|| format!("'{}' is not a valid session id", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "9b2d3f51-6f1c-4a8e-8a57-0d3c2f6b7e10";

    #[test]
    fn extracts_plain_body() {
        let token_id = extract_token_id(&format!("{}\n", ID), None).unwrap();
        assert_eq!(token_id.to_string(), ID);
    }

    #[test]
    fn extracts_top_level_key_and_pointer() {
        let body = format!(r#"{{"session_id":"{ID}","data":{{"session":{{"id":"{ID}"}}}}}}"#);
        assert_eq!(extract_token_id(&body, Some("session_id")).unwrap().to_string(), ID);
        assert_eq!(extract_token_id(&body, Some("/data/session/id")).unwrap().to_string(), ID);
    }

    #[test]
    fn missing_field_is_an_error() {
        let err = extract_token_id(r#"{"other":"x"}"#, Some("session_id")).unwrap_err();
        assert!(err.to_string().contains("session_id"));
    }

    #[test]
    fn literal_header_value_is_passed_through() {
        let value = prepare_generic_source_value(&GenericSourceValue::Literal { value: "Bearer abc".into() }).unwrap();
        assert_eq!(value, "Bearer abc");
    }
}
