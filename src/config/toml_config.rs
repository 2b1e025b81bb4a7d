use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Harvest definition file. Every field is optional; anything absent falls
/// back to the matching CLI flag or built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestFileConfig {
    #[serde(default)]
    pub harvest: HarvestSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub serve: ServeSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestSection {
    pub keyword: Option<String>,
    pub pages: Option<u32>,
    pub limit: Option<u32>,
    pub base_url: Option<String>,
    pub modified_after: Option<NaiveDate>,
    pub modified_before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServeSection {
    pub port: Option<u16>,
}

impl HarvestFileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// Replace `${VAR}` markers with environment values. Unknown variables are
/// left in place so any resulting TOML error points at them.
fn substitute_env_vars(content: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let content = r#"
[harvest]
keyword = "kcpedia"
pages = 3
limit = 50
base_url = "https://www.researchcatalogue.net/portal/search-result"
modified_after = "2024-01-01"

[output]
path = "./data"

[serve]
port = 2019
"#;

        let config = HarvestFileConfig::from_toml_str(content).unwrap();
        assert_eq!(config.harvest.keyword.as_deref(), Some("kcpedia"));
        assert_eq!(config.harvest.pages, Some(3));
        assert_eq!(
            config.harvest.modified_after,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(config.output.path.as_deref(), Some("./data"));
        assert_eq!(config.serve.port, Some(2019));
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = HarvestFileConfig::from_toml_str("").unwrap();
        assert!(config.harvest.keyword.is_none());
        assert!(config.output.path.is_none());
        assert!(config.serve.port.is_none());
    }

    #[test]
    fn test_partial_sections_parse() {
        let content = r#"
[harvest]
keyword = "soundart"
"#;
        let config = HarvestFileConfig::from_toml_str(content).unwrap();
        assert_eq!(config.harvest.keyword.as_deref(), Some("soundart"));
        assert!(config.harvest.pages.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RC_ETL_TEST_KEYWORD", "kcpedia");
        let content = r#"
[harvest]
keyword = "${RC_ETL_TEST_KEYWORD}"
"#;
        let config = HarvestFileConfig::from_toml_str(content).unwrap();
        assert_eq!(config.harvest.keyword.as_deref(), Some("kcpedia"));
    }

    #[test]
    fn test_unknown_env_var_left_in_place() {
        let content = r#"
[harvest]
keyword = "${RC_ETL_TEST_DOES_NOT_EXIST}"
"#;
        let config = HarvestFileConfig::from_toml_str(content).unwrap();
        assert_eq!(
            config.harvest.keyword.as_deref(),
            Some("${RC_ETL_TEST_DOES_NOT_EXIST}")
        );
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let result = HarvestFileConfig::from_toml_str("[harvest\nkeyword = ");
        assert!(matches!(result, Err(EtlError::ConfigError { .. })));
    }
}
