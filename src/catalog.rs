//! Ontology catalog fetcher
//!
//! Reads an OBO Foundry registry dump (`ontologies.jsonld`) and downloads the
//! `{id}.obo` product of each listed ontology into a local directory. A failed
//! download is recorded in the report and the batch carries on.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::error::{DatasetError, Result};

#[derive(Debug, Deserialize)]
struct RegistryDump {
    ontologies: Vec<RegistryEntry>,
}

#[derive(Debug, Deserialize)]
struct RegistryEntry {
    id: String,
    #[serde(default)]
    products: Vec<RegistryProduct>,
}

#[derive(Debug, Deserialize)]
struct RegistryProduct {
    id: String,
    #[serde(default)]
    ontology_purl: Option<String>,
}

/// A downloadable ontology file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogResource {
    pub id: String,
    pub url: String,
}

impl CatalogResource {
    pub fn file_name(&self) -> String {
        format!("{}.obo", self.id)
    }
}

/// Resources selected from a registry dump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogManifest {
    pub resources: Vec<CatalogResource>,
}

impl CatalogManifest {
    /// Select each ontology's `{id}.obo` product, skipping `skip_ids`
    pub fn from_jsonld(text: &str, skip_ids: &[String]) -> Result<Self> {
        let dump: RegistryDump = serde_json::from_str(text)
            .map_err(|e| DatasetError::Manifest(format!("invalid registry dump: {e}")))?;

        let mut resources = Vec::new();
        for entry in dump.ontologies {
            if skip_ids.contains(&entry.id) {
                continue;
            }
            let wanted = format!("{}.obo", entry.id);
            for product in entry.products {
                if product.id != wanted {
                    continue;
                }
                if let Some(url) = product.ontology_purl {
                    resources.push(CatalogResource {
                        id: entry.id.clone(),
                        url,
                    });
                }
            }
        }

        Ok(Self { resources })
    }

    pub fn load(path: &Path, skip_ids: &[String]) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_jsonld(&text, skip_ids)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Outcome of a batch download
#[derive(Debug, Default)]
pub struct FetchReport {
    pub fetched: Vec<PathBuf>,
    /// `(resource id, error message)`
    pub failed: Vec<(String, String)>,
}

pub struct CatalogFetcher {
    client: reqwest::Client,
}

impl CatalogFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> anyhow::Result<Self> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Download one resource to `{out_dir}/{id}.obo`
    pub async fn fetch(&self, resource: &CatalogResource, out_dir: &Path) -> anyhow::Result<PathBuf> {
        let bytes = self
            .client
            .get(&resource.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", resource.url))?
            .error_for_status()
            .with_context(|| format!("Bad status for {}", resource.url))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", resource.url))?;

        let path = out_dir.join(resource.file_name());
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Download every resource sequentially; failures are collected, not fatal
    pub async fn fetch_all(
        &self,
        manifest: &CatalogManifest,
        out_dir: &Path,
    ) -> anyhow::Result<FetchReport> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;

        let mut report = FetchReport::default();
        for resource in &manifest.resources {
            match self.fetch(resource, out_dir).await {
                Ok(path) => {
                    info!(id = %resource.id, path = %path.display(), "Fetched ontology");
                    report.fetched.push(path);
                }
                Err(e) => {
                    warn!(id = %resource.id, error = %format!("{e:#}"), "Failed to fetch ontology");
                    report.failed.push((resource.id.clone(), format!("{e:#}")));
                }
            }
        }

        info!(
            fetched = report.fetched.len(),
            failed = report.failed.len(),
            "Catalog fetch finished"
        );
        Ok(report)
    }
}
