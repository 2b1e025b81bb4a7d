#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

use crate::domain::model::OutputFormat;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use chrono::NaiveDate;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://www.researchcatalogue.net/portal/search-result";
pub const DEFAULT_KEYWORD: &str = "kcpedia";
pub const DEFAULT_PAGES: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_PORTALS_INPUT: &str = "rc.json";
pub const DEFAULT_SERVE_PORT: u16 = 2019;
pub const DEFAULT_PROXY_PORT: u16 = 3000;
pub const DEFAULT_PROXY_LIMIT: u32 = 250;

/// Fully resolved harvest parameters. Flag values win over config-file
/// values, which win over the built-in defaults.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub base_url: String,
    pub keyword: String,
    pub pages: u32,
    pub page_limit: u32,
    pub output_path: String,
    pub modified_after: Option<NaiveDate>,
    pub modified_before: Option<NaiveDate>,
    pub serve_port: u16,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            keyword: DEFAULT_KEYWORD.to_string(),
            pages: DEFAULT_PAGES,
            page_limit: DEFAULT_PAGE_LIMIT,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            modified_after: None,
            modified_before: None,
            serve_port: DEFAULT_SERVE_PORT,
        }
    }
}

impl ConfigProvider for HarvestOptions {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn keyword(&self) -> &str {
        &self.keyword
    }

    fn pages(&self) -> u32 {
        self.pages
    }

    fn page_limit(&self) -> u32 {
        self.page_limit
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn modified_after(&self) -> Option<NaiveDate> {
        self.modified_after
    }

    fn modified_before(&self) -> Option<NaiveDate> {
        self.modified_before
    }
}

impl Validate for HarvestOptions {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_non_empty_string("keyword", &self.keyword)?;
        validate_positive_number("pages", self.pages as usize, 1)?;
        validate_positive_number("limit", self.page_limit as usize, 1)?;
        validate_path("output_path", &self.output_path)?;
        Ok(())
    }
}

/// Options for the portal aggregation step.
#[derive(Debug, Clone)]
pub struct PortalsOptions {
    pub input: String,
    pub key: Option<String>,
    pub with_ids: bool,
    pub formats: Vec<OutputFormat>,
    pub output_path: String,
}

impl PortalsOptions {
    /// The dataset key holding the entry list. Defaults to the input file
    /// stem, so a file written by the fetch step round-trips unchanged.
    pub fn dataset_key(&self) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => Path::new(&self.input)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("rc")
                .to_string(),
        }
    }
}

impl Default for PortalsOptions {
    fn default() -> Self {
        Self {
            input: DEFAULT_PORTALS_INPUT.to_string(),
            key: None,
            with_ids: false,
            formats: vec![OutputFormat::Json],
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

impl Validate for PortalsOptions {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extensions("input", std::slice::from_ref(&self.input), &["json"])?;
        if self.formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "formats".to_string(),
            });
        }
        validate_path("output_path", &self.output_path)?;
        Ok(())
    }
}
