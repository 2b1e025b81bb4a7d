use clap::Parser;
use rc_etl::config::cli::{Cli, Command, FetchArgs, PortalsArgs};
use rc_etl::config::toml_config::HarvestFileConfig;
use rc_etl::server::{self, ProxyOptions};
use rc_etl::utils::error::ErrorSeverity;
use rc_etl::utils::{logger, validation::Validate};
use rc_etl::{EtlEngine, HarvestPipeline, LocalStorage, PortalsPipeline};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting rc-etl CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let result = match cli.command {
        Command::Fetch(args) => run_fetch(args, monitor_enabled).await,
        Command::Portals(args) => run_portals(args, monitor_enabled).await,
        Command::Serve(args) => server::serve_dataset(PathBuf::from(&args.file), args.port).await,
        Command::Proxy(args) => {
            let options = ProxyOptions {
                base_url: args.base_url,
                limit: args.limit,
            };
            server::serve_proxy(options, args.port).await
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Process failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run_fetch(args: FetchArgs, monitor_enabled: bool) -> rc_etl::Result<()> {
    let file_config = match &args.config {
        Some(path) => Some(HarvestFileConfig::from_file(path)?),
        None => None,
    };

    let options = args.resolve(file_config.as_ref());
    options.validate()?;

    let storage = LocalStorage::new(options.output_path.clone());
    let pipeline = HarvestPipeline::new(storage, options.clone());
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let output_path = engine.run().await?;
    tracing::info!("✅ Harvest completed successfully!");
    println!("📁 Dataset saved to: {}", output_path);

    if args.serve {
        server::serve_dataset(PathBuf::from(&output_path), options.serve_port).await?;
    }

    Ok(())
}

async fn run_portals(args: PortalsArgs, monitor_enabled: bool) -> rc_etl::Result<()> {
    let options = args.to_options();
    options.validate()?;

    let storage = LocalStorage::new(options.output_path.clone());
    let pipeline = PortalsPipeline::new(storage, options);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let output_path = engine.run().await?;
    tracing::info!("✅ Portal aggregation completed successfully!");
    tracing::info!("📁 Output saved to: {}", output_path);

    Ok(())
}
