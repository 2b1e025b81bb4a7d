use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting ETL process...");

        tracing::info!("Extracting data...");
        let raw = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        tracing::info!("Transforming data...");
        let output = self.pipeline.transform(raw).await?;
        self.monitor.log_stats("Transform");

        tracing::info!("Loading data...");
        let output_path = self.pipeline.load(output).await?;
        self.monitor.log_stats("Load");

        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
