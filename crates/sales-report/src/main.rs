mod bootstrap;
mod presenter;

use anyhow::Result;
use sales_core::settings::Settings;
use sales_runtime::report::{ReportBuilder, ReportOptions};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(settings.effective_log_level())?;
    settings.validate()?;

    tracing::info!("Sales report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Previous: {}, Current: {}, Format: {}",
        settings
            .previous
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
        settings.current.display(),
        settings.format
    );

    let mut builder = ReportBuilder::new(ReportOptions::from_settings(&settings));
    let report = builder.generate(settings.previous.as_deref(), &settings.current)?;

    match settings.format.as_str() {
        "json" => println!("{}", report.to_json()?),
        _ => println!("{}", presenter::render_text(&report)),
    }

    Ok(())
}
