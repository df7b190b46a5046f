use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use accelprobe::config::{OutputFormat, ProbeConfig};
use accelprobe::opencl::{error_to_str, DeviceType, OpenCl};

#[derive(Parser)]
#[command(
    name = "accelprobe",
    about = "Report OpenCL platform and device capabilities",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (default: $ACCELPROBE_CONFIG, then /etc/accelprobe/accelprobe.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report one platform and one device, then open a command queue on it
    Report(ReportArgs),

    /// Translate an OpenCL status code to its name
    Status {
        /// Numeric status code, e.g. -30
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },

    /// Open the hardware performance counters once and print their values
    #[cfg(target_os = "linux")]
    Counters {
        /// Process to measure (0 = this process)
        #[arg(long, default_value = "0")]
        pid: i32,

        /// CPU to measure (-1 = any)
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        cpu: i32,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct ReportArgs {
    /// Platform index (overrides config)
    #[arg(long)]
    platform: Option<usize>,

    /// Device type to select (overrides config)
    #[arg(long, value_enum)]
    device_type: Option<DeviceType>,

    /// JSON output for machine parsing
    #[arg(long)]
    json: bool,

    /// OpenCL runtime library to try; repeatable (overrides config)
    #[arg(long = "library")]
    libraries: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise start at `warn` and switch to the configured
    // level once the config file has been read.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("warn")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::load_or_default(),
    };

    if !from_env {
        filter_handle
            .reload(EnvFilter::new(&config.logging.level))
            .context("failed to apply configured log level")?;
    }

    match cli.command.unwrap_or_else(|| Commands::Report(ReportArgs::default())) {
        Commands::Report(args) => report(&config, args)?,
        Commands::Status { code } => println!("{}", error_to_str(code)),
        #[cfg(target_os = "linux")]
        Commands::Counters { pid, cpu, json } => counters(pid, cpu, json)?,
    }

    Ok(())
}

fn report(config: &ProbeConfig, args: ReportArgs) -> Result<()> {
    let mut options = config.probe_options();
    if let Some(index) = args.platform {
        options.platform_index = index;
    }
    if let Some(device_type) = args.device_type {
        options.device_type = device_type;
    }
    let libraries = if args.libraries.is_empty() {
        config.opencl.library_paths.clone()
    } else {
        args.libraries
    };
    let format = if args.json {
        OutputFormat::Json
    } else {
        config.output.format
    };

    tracing::info!(
        platform = options.platform_index,
        device_type = %options.device_type,
        ?format,
        "Running capability report"
    );
    let runtime = OpenCl::load(&libraries)?;
    tracing::debug!(library = %runtime.path().display(), "Using OpenCL runtime");

    match format {
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            accelprobe::probe::run(&&runtime, &options, &mut out)?;
        }
        OutputFormat::Json => {
            let report = accelprobe::probe::run(&&runtime, &options, &mut io::sink())?;
            let json_output =
                serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            println!("{}", json_output);
        }
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn counters(pid: i32, cpu: i32, json: bool) -> Result<()> {
    use std::io::Write;

    tracing::info!(pid, cpu, "Probing hardware performance counters");
    let probes = accelprobe::perf::probe_all(pid, cpu);

    if json {
        println!("{}", serde_json::to_string_pretty(&probes)?);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{:<18} | {:<11} | Value", "Counter", "Status")?;
    writeln!(out, "{:-<18}-|-{:-<11}-|-{:-<20}", "", "", "")?;
    for probe in &probes {
        let (status, detail) = if probe.is_available() {
            ("opened", probe.value.unwrap_or_default().to_string())
        } else {
            ("unavailable", probe.error.clone().unwrap_or_default())
        };
        writeln!(out, "{:<18} | {:<11} | {}", probe.kind, status, detail)?;
    }
    Ok(())
}
