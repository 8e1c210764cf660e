mod cli;

use cli::Args;
use sbom_collector::adapters::outbound::console::StderrProgressReporter;
use sbom_collector::adapters::outbound::converter::CycloneDxCliConverter;
use sbom_collector::application::dto::PipelineResponse;
use sbom_collector::application::factories::{ProviderFactory, StorageFactory};
use sbom_collector::application::use_cases::RunPipelineUseCase;
use sbom_collector::config::{self, ConfigFile, PipelineConfig};
use sbom_collector::ports::outbound::ProgressReporter;
use sbom_collector::sbom_processing::services::LicenseMapper;
use sbom_collector::shared::error::ExitCode;
use sbom_collector::shared::Result;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // clap exits with code 2 on invalid arguments
    let args = Args::parse_args();

    match run(args).await {
        Ok(()) => process::exit(ExitCode::Success.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            for cause in e.chain().skip(1) {
                eprintln!("\nCaused by: {}", cause);
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (file, base_dir) = load_config_file(args.config.as_deref())?;
    let config = PipelineConfig::from_sources(file, &args.overrides(), &base_dir)?;

    // Create adapters (Dependency Injection)
    let progress_reporter: Arc<dyn ProgressReporter> = Arc::new(StderrProgressReporter::new());
    let provider = match &config.provider {
        Some(settings) => {
            progress_reporter.report(ProviderFactory::progress_message(settings));
            Some(ProviderFactory::create(settings, progress_reporter.clone())?)
        }
        None => None,
    };
    let object_store = StorageFactory::create_object_store(&config.object_store)?;
    let sink = StorageFactory::create_sink(config.clickhouse.as_ref())?;
    let converter = Arc::new(CycloneDxCliConverter::new(config.converter.clone()));

    let use_case = RunPipelineUseCase::new(
        provider,
        object_store,
        converter,
        sink,
        LicenseMapper::new(config.license_mapping),
        progress_reporter,
    );

    let response = use_case.execute(config.request).await?;
    print_summary(&response);

    Ok(())
}

/// Loads the explicit config file, or the one discovered in the working directory
///
/// Relative paths inside the file resolve against the file's directory.
fn load_config_file(explicit: Option<&Path>) -> Result<(ConfigFile, PathBuf)> {
    if let Some(path) = explicit {
        let file = config::load_config_from_path(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok((file, base_dir));
    }

    let cwd = std::env::current_dir()?;
    let file = config::discover_config(&cwd)?.unwrap_or_default();
    Ok((file, cwd))
}

fn print_summary(response: &PipelineResponse) {
    eprintln!("\n📊 Summary");
    eprintln!("   Output:     {}", response.output_location);
    eprintln!("   Components: {}", response.component_count);
    match response.rows_written {
        Some(rows) => eprintln!("   Rows:       {}", rows),
        None => eprintln!("   Rows:       (no sink configured)"),
    }
    if !response.rejected_candidates.is_empty() {
        eprintln!("   Skipped:    {}", response.rejected_candidates.len());
        for rejected in &response.rejected_candidates {
            eprintln!("     - {}: {}", rejected.key, rejected.reason);
        }
    }
}
