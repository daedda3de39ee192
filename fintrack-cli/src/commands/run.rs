//! Run command - one ingestion from the command line

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use fintrack_core::adapters::memory::MemoryBlobStore;
use fintrack_core::ports::BlobStore;
use fintrack_core::{Config, IngestRequest, IngestService};

use crate::output;

pub async fn run(
    config: Arc<Config>,
    start_date: Option<String>,
    end_date: Option<String>,
    dry_run: bool,
    json: bool,
) -> Result<ExitCode> {
    let memory = dry_run.then(|| Arc::new(MemoryBlobStore::new()));
    let blobs = memory.clone().map(|m| m as Arc<dyn BlobStore>);

    let service = IngestService::from_config(config, blobs)?;
    let summary = service
        .handle(&IngestRequest::new(start_date, end_date))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        if dry_run {
            println!("{}", "DRY RUN - nothing uploaded".yellow());
            println!();
        }
        output::print_summary(&summary);

        if let Some(memory) = &memory {
            let blobs = memory.blobs();
            if !blobs.is_empty() {
                println!();
                println!("{}", "Would upload:".bold());
                for blob in blobs {
                    println!(
                        "  {}/{} ({})",
                        blob.container,
                        blob.name,
                        output::format_size(blob.data.len() as u64)
                    );
                }
            }
        }
    }

    if summary.is_complete_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
