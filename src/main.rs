use anyhow::{Context, Result};
use clap::Parser;
use gstat::cli::{Cli, OutputFormat};
use gstat::config::GstatConfig;
use gstat::csv_output::CsvStatsOutput;
use gstat::figure::assemble;
use gstat::html_output::HtmlOutput;
use gstat::json_output::JsonReport;
use gstat::layout::{SeriesSet, TraceLayout};
use gstat::snapshot::DatasetSnapshot;
use gstat::store::AggregateStore;
use gstat::text_output::render_summary;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings always, everything with --debug
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File configuration with command-line overrides applied
fn resolve_config(args: &Cli) -> Result<GstatConfig> {
    let mut config = match &args.config {
        Some(path) => GstatConfig::from_file(path)?,
        None => GstatConfig::default(),
    };

    if let Some(list) = &args.percentiles {
        config.percentiles = GstatConfig::parse_percentiles(list)?;
    }
    if let Some(bucket_secs) = args.bucket_secs {
        config.bucket_secs = bucket_secs;
    }
    if let Some(expr) = &args.filter {
        config.request_filter = Some(expr.clone());
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if args.skip_invalid_runs {
        config.skip_invalid_runs = true;
    }

    config.validate()?;
    Ok(config)
}

fn render(format: OutputFormat, store: &AggregateStore, config: &GstatConfig) -> Result<String> {
    let rendered = match format {
        OutputFormat::Html => {
            let layout = TraceLayout::plan(store, &SeriesSet::for_percentiles(store.percentiles()));
            let figure = assemble(store, &layout, &config.figure_options())?;
            tracing::debug!(
                "figure: {} traces, {} run buttons, {} request buttons",
                layout.len(),
                figure.visibility.runs.len(),
                figure.visibility.requests.len()
            );
            HtmlOutput::new(store, &figure, &config.title).to_html()?
        }
        OutputFormat::Text => render_summary(store),
        OutputFormat::Json => JsonReport::from_store(store).to_json()?,
        OutputFormat::Csv => CsvStatsOutput::new(store).to_csv()?,
    };
    Ok(rendered)
}

fn write_output(target: Option<&Path>, contents: &str) -> Result<()> {
    match target {
        Some(path) if path != Path::new("-") => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = resolve_config(&args)?;
    let snapshot = DatasetSnapshot::load(&args.results_dir, config).with_context(|| {
        format!(
            "Failed to load simulation results from {}",
            args.results_dir.display()
        )
    })?;
    tracing::debug!("dataset fingerprint {}", snapshot.fingerprint());

    let store = snapshot.store();
    let contents = render(args.format, &store, snapshot.config())?;

    let target = args
        .output
        .clone()
        .or_else(|| args.format.default_output().map(Into::into));
    write_output(target.as_deref(), &contents)?;

    Ok(())
}
