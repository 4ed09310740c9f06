use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor_enabled: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor_enabled,
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let mut monitor = RunMonitor::new(self.monitor_enabled);
        tracing::info!("🚀 Starting price tracking run");

        // Extract
        tracing::info!("🌊 Fetching venue pages...");
        let extracted = self.pipeline.extract().await?;
        monitor.finish_phase("extract");

        // Transform
        tracing::info!("🔄 Updating history and aggregates...");
        let transformed = self.pipeline.transform(extracted).await?;
        monitor.finish_phase("transform");

        // Load
        tracing::info!("💾 Writing outputs...");
        let output_path = self.pipeline.load(transformed).await?;
        monitor.finish_phase("load");

        monitor.log_final_stats();
        Ok(output_path)
    }
}
