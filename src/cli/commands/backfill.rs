//! Backfill command implementation.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::services::Services;
use anyhow::Result;

/// Run the backfill command.
pub async fn run_backfill(settings: Settings) -> Result<()> {
    let services = Services::initialize(&settings).await?;
    let pipeline = preflight::require_pipeline(&services)?;

    let spinner = Output::spinner("Backfilling completed transcriptions...");
    let report = pipeline.backfill().await;
    spinner.finish_and_clear();

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Backfill failed: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Backfill");
    Output::kv("Total", &report.total.to_string());
    Output::kv("Processed", &report.processed.to_string());
    Output::kv("Failed", &report.failed.to_string());

    if report.failed > 0 {
        Output::warning("Some jobs failed. Run with -v to see why, then re-run backfill.");
    } else {
        Output::success("Backfill completed");
    }

    Ok(())
}
