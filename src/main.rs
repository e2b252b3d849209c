//! Gatelattice CLI: gateway server, headless runs, kernel dumps, remote snapshots

use anyhow::Context;
use clap::{Parser, Subcommand};
use gatelattice::report;
use gatelattice_client::{http::DEFAULT_BASE_URL, HttpStore};
use gatelattice_core::{BindMode, MAX_SIZE, MIN_SIZE};
use gatelattice_engine::{
    build_kernel_volume, Automaton, AutomatonConfig, LatticeConfig, SnapshotStore, DEFAULT_WINDOW,
};
use gatelattice_gateway::start_gateway;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "gatelattice",
    about = "3D binary cellular automaton driven by weighted logic-gate kernels"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (snapshot service and automaton control)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// loopback or lan
        #[arg(short, long)]
        bind: Option<String>,
        #[arg(short, long, default_value = "gatelattice.toml")]
        config: PathBuf,
        #[arg(short, long)]
        size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Write logs to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Run the automaton headless, printing one metrics line per tick
    Run {
        #[arg(short, long, default_value_t = 9)]
        size: usize,
        #[arg(short, long, default_value_t = 20)]
        ticks: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Export the metrics window as CSV (file, or directory for the default name)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the middle depth slice after the last tick
        #[arg(long, default_value_t = false)]
        show: bool,
        /// Gateway used by --save
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        remote: String,
        /// Save the final state to the gateway under this name
        #[arg(long)]
        save: Option<String>,
    },
    /// Print kernel slices as gate letters
    Kernel {
        #[arg(short, long, default_value_t = 9)]
        size: usize,
        /// Only this depth (default: all)
        #[arg(short, long)]
        depth: Option<usize>,
    },
    /// Browse snapshots held by a gateway
    Saves {
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        remote: String,
        #[command(subcommand)]
        action: SavesAction,
    },
    /// Print the effective configuration as TOML
    Config {
        #[arg(short, long, default_value = "gatelattice.toml")]
        config: PathBuf,
    },
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum SavesAction {
    /// List snapshots, newest first
    List,
    /// Show one snapshot and its middle depth slice
    Show { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            config,
            size,
            seed,
            log_file,
        } => {
            let _guard = init_tracing("gatelattice=info,tower_http=info", log_file.as_deref())?;

            let mut config = LatticeConfig::load(&config);
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(bind) = bind {
                config.gateway.bind = BindMode::parse(&bind);
            }
            if let Some(size) = size {
                config.automaton.size = size;
            }
            if seed.is_some() {
                config.automaton.seed = seed;
            }
            start_gateway(config).await?;
        }

        Commands::Run {
            size,
            ticks,
            seed,
            csv,
            show,
            remote,
            save,
        } => {
            let _guard = init_tracing("gatelattice=warn", None)?;
            let csv = csv.as_deref();
            run_headless(size, ticks, seed, csv, show, &remote, save.as_deref()).await?;
        }

        Commands::Kernel { size, depth } => {
            print_kernel(size, depth)?;
        }

        Commands::Saves { remote, action } => {
            let _guard = init_tracing("gatelattice=warn", None)?;
            let store = HttpStore::new(remote);
            match action {
                SavesAction::List => {
                    let metas = store.list().await?;
                    if metas.is_empty() {
                        println!("No saved states at {}", store.base_url());
                    }
                    for meta in &metas {
                        println!("{}", report::snapshot_line(meta));
                    }
                }
                SavesAction::Show { id } => {
                    let snapshot = store.load(&id).await?;
                    println!("{}", report::snapshot_line(&snapshot.meta()));
                    let depth = snapshot.lattice.side() / 2;
                    println!("z={}", depth);
                    println!("{}", report::lattice_slice(&snapshot.lattice.slice(depth)?));
                }
            }
        }

        Commands::Config { config } => {
            let config = LatticeConfig::load(&config);
            config.validate()?;
            print!("{}", config.to_toml());
        }

        Commands::Version => {
            println!(
                "gatelattice v{} (lattice sizes {}..={})",
                env!("CARGO_PKG_VERSION"),
                MIN_SIZE,
                MAX_SIZE
            );
        }
    }

    Ok(())
}

/// Logs go to stderr, or to `log_file` through a non-blocking writer whose
/// guard must outlive the program.
fn init_tracing(
    default_filter: &str,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("--log-file {} has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}

async fn run_headless(
    size: usize,
    ticks: u64,
    seed: Option<u64>,
    csv: Option<&Path>,
    show: bool,
    remote: &str,
    save: Option<&str>,
) -> anyhow::Result<()> {
    let mut automaton = Automaton::new(&AutomatonConfig {
        size,
        metrics_window: DEFAULT_WINDOW,
        seed,
    })?;

    for _ in 0..ticks {
        let record = automaton.step()?;
        println!("{}", report::metrics_line(&record));
    }

    if show {
        let depth = automaton.default_depth();
        println!("z={}", depth);
        println!("{}", report::lattice_slice(&automaton.slice(depth)?));
    }

    if let Some(csv) = csv {
        let target = if csv.is_dir() {
            csv.join(automaton.metrics().export_file_name())
        } else {
            csv.to_path_buf()
        };
        std::fs::write(&target, automaton.metrics().to_csv())
            .with_context(|| format!("writing {}", target.display()))?;
        eprintln!("Wrote: {}", target.display());
    }

    if let Some(name) = save {
        let store = HttpStore::new(remote);
        let meta = store.save(automaton.save_request(name)?).await?;
        println!("Saved {}", report::snapshot_line(&meta));
    }

    Ok(())
}

fn print_kernel(size: usize, depth: Option<usize>) -> anyhow::Result<()> {
    let kernel = build_kernel_volume(size)?;
    let depths: Vec<usize> = match depth {
        Some(z) if z < size => vec![z],
        Some(z) => anyhow::bail!("depth {} out of range for size {}", z, size),
        None => (0..size).collect(),
    };

    println!("{}", report::gate_legend());
    for z in depths {
        let Some(slice) = kernel.slice(z) else {
            continue;
        };
        println!();
        println!("z={}  [{}]", z, report::gate_census(slice));
        println!("{}", report::kernel_slice(slice));
    }
    Ok(())
}
