use housing_panel::analyzer::summary::write_summary;
use housing_panel::config::{load_config, AppConfig};
use housing_panel::model::StorageError;
use housing_panel::parser::CsvParser;
use housing_panel::pipeline::{self, PanelOutput};
use housing_panel::serializer::write_csv;
use housing_panel::source::FileReader;
use housing_panel::storage::PanelStore;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());

    // Load configuration from file
    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Window: {} to {}", config.start_date, config.end_date);

    // Stage reports are logged as the pipeline records them.
    let outcome = pipeline::run(&config, &FileReader::new(), &CsvParser::new());
    let failed = outcome.failed_stages().count();
    if failed > 0 {
        warn!("{} stage(s) failed", failed);
    }

    let output = match outcome.result {
        Ok(output) => output,
        Err(e) => {
            error!("Panel not built: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Panel: {} months ({} to {})",
        output.panel.len(),
        output.summary.first_month.as_deref().unwrap_or("-"),
        output.summary.last_month.as_deref().unwrap_or("-")
    );

    // Each output is independent; one failing does not block the others.
    let mut failures = 0;
    if let Some(path) = &config.output.csv_path {
        failures += report_write("CSV", path, write_csv_file(path, &output));
    }
    if let Some(path) = &config.output.sqlite_path {
        failures += report_write("SQLite", path, write_sqlite(path, &output));
    }
    if let Some(path) = &config.output.summary_path {
        failures += report_write("summary", path, write_summary_file(path, &output));
    }

    if failures > 0 {
        warn!("{} output(s) could not be written", failures);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn report_write(what: &str, path: &Path, result: Result<(), StorageError>) -> usize {
    match result {
        Ok(()) => {
            info!("Saved {} output: {}", what, path.display());
            0
        }
        Err(e) => {
            error!("Failed to write {} output {}: {}", what, path.display(), e);
            1
        }
    }
}

fn create_file(path: &Path) -> Result<BufWriter<File>, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

fn write_csv_file(path: &Path, output: &PanelOutput) -> Result<(), StorageError> {
    write_csv(create_file(path)?, &output.records)
}

fn write_summary_file(path: &Path, output: &PanelOutput) -> Result<(), StorageError> {
    write_summary(create_file(path)?, &output.summary)
}

fn write_sqlite(path: &Path, output: &PanelOutput) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut store = PanelStore::new(path)?;
    store.save_panel(&output.records)?;
    Ok(())
}
