use anyhow::{Context, Result};
use causanet::{
    cli::{Cli, OutputFormat},
    csv_output::CsvOutput,
    discovery::discover_all,
    event_log::EventLog,
    json_output::JsonOutput,
    text_output,
};
use clap::Parser;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_log(args: &Cli) -> Result<EventLog> {
    let mut log = EventLog::from_path(&args.input, args.delimiter)
        .with_context(|| format!("Failed to read event log: {}", args.input.display()))?;

    if let Some(entity_type) = &args.entity_type {
        if log.traces(entity_type).is_none() {
            let available: Vec<&str> = log.entity_types().map(String::as_str).collect();
            anyhow::bail!(
                "Unknown entity type '{}' (available: {})",
                entity_type,
                available.join(", ")
            );
        }
        log.retain_entity_type(entity_type);
    }

    Ok(log)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.discovery_config()?;
    config.warn_out_of_range();

    let trace_sets = load_log(&args)?.into_trace_sets();
    if trace_sets.is_empty() {
        tracing::warn!("event log contains no traces");
    }

    let nets = discover_all(&trace_sets, &config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.format {
        OutputFormat::Text => {
            for (entity_type, traces) in &trace_sets {
                if let Some(net) = nets.get(entity_type) {
                    text_output::write_summary(&mut out, entity_type, traces, net, args.variants)?;
                }
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            for (entity_type, traces) in &trace_sets {
                if let Some(net) = nets.get(entity_type) {
                    output.add_entity_type(entity_type, traces, net, args.variants);
                }
            }
            writeln!(out, "{}", output.to_json()?)?;
        }
        OutputFormat::Csv => {
            let mut output = CsvOutput::new();
            for (entity_type, net) in &nets {
                output.add_net(entity_type, net);
            }
            write!(out, "{}", output.to_csv())?;
        }
    }

    Ok(())
}
