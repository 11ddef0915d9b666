use mixtap::{
    audio::{
        adapter::SupplyAdapter,
        driver::DriveMode,
        format::AudioFormat,
        mix::MixingEngine,
        source::{FileSource, QueuedPushSource, SignalGenerator, Supplier},
    },
    common::{AnyResult, logger},
    configs::{Config, SourceConfig},
};
use serde_json::json;
use tracing::{info, warn};

fn build_supplier(config: &Config, format: AudioFormat) -> Supplier {
    match &config.source {
        SourceConfig::Generator(generator) => SignalGenerator::new(generator.options()).into(),
        SourceConfig::File(file) => FileSource::new(file.options()).into(),
        SourceConfig::Queue => QueuedPushSource::new(config.queue.options(format)).into(),
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let (config, path) = Config::load()?;
    logger::init(config.logging.as_ref());
    info!("Loaded configuration from {}", path.display());

    let format = config.output.format()?;
    let supplier = build_supplier(&config, format);
    info!("Supplying {} audio as {}", supplier.kind(), format);

    let mut adapter = SupplyAdapter::new(MixingEngine::new(supplier, config.mixer.options()));
    adapter.start()?;

    let (mode, frames) = DriveMode::Host(adapter).into_standalone(
        format,
        config.driver.options(config.output.frame_ms),
    );
    let Some(frames) = frames else {
        return Err("standalone driver did not start".into());
    };

    let publisher = tokio::spawn(async move {
        let mut published = 0u64;
        let mut bytes = 0usize;
        while let Ok(frame) = frames.recv_async().await {
            published += 1;
            bytes += frame.frame.len();
        }
        (published, bytes)
    });

    match config.driver.run_for() {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = tokio::signal::ctrl_c() => warn!("Interrupted"),
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    let driver_stats = match &mode {
        DriveMode::Standalone(driver) => Some(driver.stats()),
        DriveMode::Host(_) => None,
    };
    let adapter = mode.shutdown().await?;
    let (published, bytes) = publisher.await?;

    let summary = json!({
        "mixer": adapter.stats(),
        "driver": driver_stats,
        "publisher": { "frames": published, "bytes": bytes },
    });
    info!("Final stats: {}", serde_json::to_string(&summary)?);

    Ok(())
}
