use crate::config::toml_config::HarvestFileConfig;
use crate::config::{
    HarvestOptions, PortalsOptions, DEFAULT_BASE_URL, DEFAULT_KEYWORD, DEFAULT_OUTPUT_PATH,
    DEFAULT_PAGES, DEFAULT_PAGE_LIMIT, DEFAULT_PORTALS_INPUT, DEFAULT_PROXY_LIMIT,
    DEFAULT_PROXY_PORT, DEFAULT_SERVE_PORT,
};
use crate::domain::model::OutputFormat;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rc-etl")]
#[command(about = "A small ETL tool for harvesting Research Catalogue portal data")]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log system resource usage per phase
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch search-result pages and normalize them into one JSON document
    Fetch(FetchArgs),
    /// Aggregate portal references out of a normalized dataset
    Portals(PortalsArgs),
    /// Serve a normalized dataset file over local HTTP
    Serve(ServeArgs),
    /// Proxy catalogue searches through a local endpoint
    Proxy(ProxyArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Search keyword; also names the dataset key and the output file
    #[arg(long)]
    pub keyword: Option<String>,

    /// Number of result pages to fetch, starting at page 0
    #[arg(long)]
    pub pages: Option<u32>,

    /// Results per page
    #[arg(long)]
    pub limit: Option<u32>,

    /// Search endpoint base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory the dataset file is written to
    #[arg(long)]
    pub output_path: Option<String>,

    /// Only include entries modified after this date (YYYY-MM-DD)
    #[arg(long)]
    pub modified_after: Option<NaiveDate>,

    /// Only include entries modified before this date (YYYY-MM-DD)
    #[arg(long)]
    pub modified_before: Option<NaiveDate>,

    /// TOML file supplying defaults for the flags above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve the written dataset file afterwards
    #[arg(long)]
    pub serve: bool,

    /// Port used by --serve
    #[arg(long)]
    pub port: Option<u16>,
}

impl FetchArgs {
    /// Merge flag values over config-file values over built-in defaults.
    pub fn resolve(&self, file: Option<&HarvestFileConfig>) -> HarvestOptions {
        let harvest = file.map(|f| &f.harvest);
        let output = file.map(|f| &f.output);
        let serve = file.map(|f| &f.serve);

        HarvestOptions {
            base_url: self
                .base_url
                .clone()
                .or_else(|| harvest.and_then(|h| h.base_url.clone()))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            keyword: self
                .keyword
                .clone()
                .or_else(|| harvest.and_then(|h| h.keyword.clone()))
                .unwrap_or_else(|| DEFAULT_KEYWORD.to_string()),
            pages: self
                .pages
                .or_else(|| harvest.and_then(|h| h.pages))
                .unwrap_or(DEFAULT_PAGES),
            page_limit: self
                .limit
                .or_else(|| harvest.and_then(|h| h.limit))
                .unwrap_or(DEFAULT_PAGE_LIMIT),
            output_path: self
                .output_path
                .clone()
                .or_else(|| output.and_then(|o| o.path.clone()))
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            modified_after: self
                .modified_after
                .or_else(|| harvest.and_then(|h| h.modified_after)),
            modified_before: self
                .modified_before
                .or_else(|| harvest.and_then(|h| h.modified_before)),
            serve_port: self
                .port
                .or_else(|| serve.and_then(|s| s.port))
                .unwrap_or(DEFAULT_SERVE_PORT),
        }
    }
}

#[derive(Debug, Args)]
pub struct PortalsArgs {
    /// Normalized dataset file to read
    #[arg(long, default_value = DEFAULT_PORTALS_INPUT)]
    pub input: String,

    /// Dataset key holding the entry list (default: input file stem)
    #[arg(long)]
    pub key: Option<String>,

    /// Emit a name-to-id mapping instead of a name list
    #[arg(long)]
    pub ids: bool,

    /// Output formats
    #[arg(long, value_delimiter = ',', default_value = "json")]
    pub formats: Vec<OutputFormat>,

    /// Directory outputs are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,
}

impl PortalsArgs {
    pub fn to_options(&self) -> PortalsOptions {
        PortalsOptions {
            input: self.input.clone(),
            key: self.key.clone(),
            with_ids: self.ids,
            formats: self.formats.clone(),
            output_path: self.output_path.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Normalized dataset file to serve
    #[arg(long, default_value = "kcpedia.json")]
    pub file: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_SERVE_PORT)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct ProxyArgs {
    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PROXY_PORT)]
    pub port: u16,

    /// Results per proxied search
    #[arg(long, default_value_t = DEFAULT_PROXY_LIMIT)]
    pub limit: u32,

    /// Upstream search endpoint
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_fetch_args() -> FetchArgs {
        FetchArgs {
            keyword: None,
            pages: None,
            limit: None,
            base_url: None,
            output_path: None,
            modified_after: None,
            modified_before: None,
            config: None,
            serve: false,
            port: None,
        }
    }

    #[test]
    fn test_resolve_defaults_without_flags_or_file() {
        let options = bare_fetch_args().resolve(None);
        assert_eq!(options.keyword, DEFAULT_KEYWORD);
        assert_eq!(options.pages, DEFAULT_PAGES);
        assert_eq!(options.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(options.serve_port, DEFAULT_SERVE_PORT);
    }

    #[test]
    fn test_resolve_file_values_fill_missing_flags() {
        let file = HarvestFileConfig::from_toml_str(
            r#"
[harvest]
keyword = "soundart"
pages = 4

[serve]
port = 4019
"#,
        )
        .unwrap();

        let options = bare_fetch_args().resolve(Some(&file));
        assert_eq!(options.keyword, "soundart");
        assert_eq!(options.pages, 4);
        assert_eq!(options.serve_port, 4019);
        // Untouched fields still fall back to the defaults.
        assert_eq!(options.page_limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_resolve_flags_beat_file_values() {
        let file = HarvestFileConfig::from_toml_str(
            r#"
[harvest]
keyword = "soundart"
"#,
        )
        .unwrap();

        let mut args = bare_fetch_args();
        args.keyword = Some("kcpedia".to_string());

        let options = args.resolve(Some(&file));
        assert_eq!(options.keyword, "kcpedia");
    }

    #[test]
    fn test_cli_parses_fetch_subcommand() {
        let cli = Cli::try_parse_from([
            "rc-etl", "fetch", "--keyword", "kcpedia", "--pages", "2", "--serve",
        ])
        .unwrap();

        match cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.keyword.as_deref(), Some("kcpedia"));
                assert_eq!(args.pages, Some(2));
                assert!(args.serve);
            }
            other => panic!("expected fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_portals_formats() {
        let cli = Cli::try_parse_from(["rc-etl", "portals", "--ids", "--formats", "json,csv"])
            .unwrap();

        match cli.command {
            Command::Portals(args) => {
                assert!(args.ids);
                assert_eq!(
                    args.formats,
                    vec![OutputFormat::Json, OutputFormat::Csv]
                );
                assert_eq!(args.input, DEFAULT_PORTALS_INPUT);
            }
            other => panic!("expected portals, got {:?}", other),
        }
    }
}
