//! `scrape` command: batch lookup across every retail source.

use medorch_dispatch::{Dispatcher, ProcessWorker, SourceId};

/// Dispatch `medicines` to the scraper and print the merged records as JSON.
///
/// Per-source failures end up in each record's `errors`; only bad arguments
/// fail the command.
pub(crate) async fn run_scrape(
    config: &medorch_core::AppConfig,
    medicines: &[String],
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let workers_per_source = workers.unwrap_or(config.workers_per_source);
    let dispatcher = Dispatcher::new(
        ProcessWorker::from_config(config),
        SourceId::ALL.to_vec(),
        workers_per_source,
    )?;

    let records = dispatcher.lookup(medicines).await?;

    let failed = records.iter().filter(|r| !r.has_any_payload()).count();
    if failed > 0 {
        tracing::warn!(failed, total = records.len(), "some medicines had no results");
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
