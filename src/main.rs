use anyhow::{Context, Result};
use clap::Parser;
use schedprobe::affinity::CpuAffinity;
use schedprobe::cli::{Cli, OutputFormat};
use schedprobe::orchestrator::{HarnessConfig, Orchestrator};
use schedprobe::plan::RunPlan;
use schedprobe::report;
use schedprobe::worker::Progress;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let plan = RunPlan::from_lists(args.threads, args.wait, &args.policies, &args.priorities)?;

    // Keep stdout clean for the JSON document
    let progress = match args.format {
        OutputFormat::Text => Progress::Stdout,
        OutputFormat::Json => Progress::Stderr,
    };
    let config = HarnessConfig {
        affinity: CpuAffinity::single(args.cpu)?,
        strict: args.strict,
        progress,
    };

    let result = Orchestrator::new(config).run(&plan)?;

    match args.format {
        OutputFormat::Text => report::print_summary(&result),
        OutputFormat::Json => {
            let json = report::to_json(&result).context("Failed to serialize JSON report")?;
            println!("{}", json);
        }
    }

    if args.strict && !result.failures.is_empty() {
        anyhow::bail!(
            "{} thread(s) failed to start (strict mode)",
            result.failures.len()
        );
    }

    Ok(())
}
