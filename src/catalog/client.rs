use log::{debug, info};
use thiserror::Error;

use crate::catalog::types::CatalogEntry;
use crate::config::{CatalogConfig, Credentials};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login rejected with status {0}")]
    LoginFailed(reqwest::StatusCode),
    #[error("query rejected with status {0}")]
    QueryFailed(reqwest::StatusCode),
}

/// Anything that can produce a raw catalog. The file cache sits in front of a
/// source, and tests substitute a counting fake to assert fetch behavior.
pub trait CatalogSource {
    fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// An authenticated session against the space-object catalog service: one
/// login POST, then the GP query GET, cookies carried between the two.
pub struct SpaceTrackClient {
    client: reqwest::blocking::Client,
    login_url: String,
    query_url: String,
    credentials: Credentials,
}

impl SpaceTrackClient {
    pub fn new(config: &CatalogConfig, credentials: Credentials) -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            login_url: config.login_url.clone(),
            query_url: config.query_url.clone(),
            credentials,
        })
    }
}

impl CatalogSource for SpaceTrackClient {
    fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        debug!("logging in to {}", self.login_url);
        let login = self
            .client
            .post(&self.login_url)
            .form(&[
                ("identity", self.credentials.identity.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()?;

        if !login.status().is_success() {
            return Err(CatalogError::LoginFailed(login.status()));
        }

        info!("login successful, querying catalog");
        let response = self.client.get(&self.query_url).send()?;
        if !response.status().is_success() {
            return Err(CatalogError::QueryFailed(response.status()));
        }

        let entries: Vec<CatalogEntry> = response.json()?;
        info!("fetched {} catalog entries", entries.len());
        Ok(entries)
    }
}
