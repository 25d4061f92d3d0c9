//! Company-name lookup through the BrasilAPI CNPJ endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use saldo_core::NameResolver;
use saldo_core::error::LookupError;
use saldo_core::extract::rules::cnpj_digits;
use saldo_core::models::config::LookupConfig;

/// Subset of the BrasilAPI company record.
#[derive(Debug, Deserialize)]
struct CompanyRecord {
    razao_social: Option<String>,
    nome_fantasia: Option<String>,
}

/// Blocking resolver for full 14-digit CNPJs. Any failure answers `None`.
pub struct BrasilApiResolver {
    client: Client,
    endpoint: String,
}

impl BrasilApiResolver {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("saldo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn company_url(&self, digits: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), digits)
    }

    fn fetch(&self, digits: &str) -> Result<Option<String>, LookupError> {
        let url = self.company_url(digits);
        debug!("Looking up company name at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let record: CompanyRecord = response
            .json()
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        Ok(record
            .razao_social
            .into_iter()
            .chain(record.nome_fantasia)
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty()))
    }
}

impl NameResolver for BrasilApiResolver {
    fn resolve(&self, cnpj: &str) -> Option<String> {
        let digits = cnpj_digits(cnpj);
        if digits.len() != 14 {
            return None;
        }

        match self.fetch(&digits) {
            Ok(name) => name,
            Err(e) => {
                warn!("CNPJ lookup for {} failed: {}", cnpj, e);
                None
            }
        }
    }
}
