//! CLI entry point for homeguard.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use homeguard_core::alerts::AlertKind;
use homeguard_core::{Host, Port};
use homeguard_history::recipients::{FileRecipientRegistry, RecipientRegistry};
use homeguard_history::stats::AlertStats;
use homeguard_history::store::{AlertQuery, AlertStore, FileAlertStore};

use homeguard_probe::config::{self, AppConfig};
use homeguard_probe::discovery::{HostnameResolver, NetworkDiscovery};
use homeguard_probe::monitor::SystemMonitor;
use homeguard_probe::reachability::{ReachabilityProber, SystemPing};
use homeguard_probe::report;
use homeguard_probe::scheduler::WatchScheduler;

#[derive(Parser)]
#[command(name = "homeguard")]
#[command(about = "Home network security monitor: reachability, port checks, and host discovery")]
struct Cli {
    /// Config file prefix (default: homeguard).
    #[arg(short, long, default_value = "homeguard", global = true)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find active hosts on the local /24 network.
    Discover,

    /// Ping a host, then check its common service ports.
    Sweep {
        #[arg(long)]
        host: Host,
    },

    /// Ping a host, then check a single TCP port.
    Probe {
        #[arg(long)]
        host: Host,

        #[arg(long)]
        port: Port,
    },

    /// List stored alerts, newest first.
    History {
        /// Only alerts of this kind (port_open, insecure_service, ...).
        #[arg(long)]
        kind: Option<AlertKind>,

        #[arg(long)]
        host: Option<Host>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Summarize stored alerts.
    Stats,

    /// Sweep the configured watch targets on their intervals.
    Watch,

    /// Manage who receives alerts.
    Recipients {
        #[command(subcommand)]
        action: RecipientsAction,
    },
}

#[derive(Subcommand)]
enum RecipientsAction {
    /// Register a recipient, or refresh an existing registration.
    Add {
        recipient: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Unregister a recipient.
    Remove { recipient: String },

    /// List registered recipients.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so reports on stdout stay clean.
    if cli.json {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let app_config = config::load(&cli.config)?;

    match cli.command {
        Command::Discover => {
            let discovery = NetworkDiscovery::new(
                HostnameResolver,
                ReachabilityProber::new(SystemPing::from_config(&app_config.probe)),
                app_config.probe.candidate_suffixes.clone(),
            );
            let result = discovery.discover_local_hosts().await?;
            print!("{}", report::discovery(&result));
        }
        Command::Sweep { host } => {
            let monitor = SystemMonitor::from_config(&app_config)?;
            let outcome = monitor.check_host_and_sweep(host).await;
            print!("{}", report::sweep(&outcome, monitor.services()));
        }
        Command::Probe { host, port } => {
            let monitor = SystemMonitor::from_config(&app_config)?;
            let outcome = monitor.check_port(host, port).await;
            print!("{}", report::probe(&outcome, monitor.services()));
        }
        Command::History { kind, host, limit } => {
            let store = open_store(&app_config)?;
            let query = AlertQuery {
                kind,
                host,
                limit: Some(limit),
                ..Default::default()
            };
            print!("{}", report::history(&store.list(&query)?));
        }
        Command::Stats => {
            let store = open_store(&app_config)?;
            let records = store.list(&AlertQuery::default())?;
            print!("{}", report::stats(&AlertStats::from_records(&records)));
        }
        Command::Watch => {
            if app_config.watch.targets.is_empty() {
                anyhow::bail!("No watch targets configured: add [[watch.targets]] to the config");
            }
            let monitor = SystemMonitor::from_config(&app_config)?;
            let scheduler = WatchScheduler::new(app_config.watch.clone(), monitor);
            scheduler.run().await;
        }
        Command::Recipients { action } => {
            let registry = FileRecipientRegistry::new(&app_config.notify.registry_file);
            match action {
                RecipientsAction::Add { recipient, name } => {
                    if registry.add(&recipient, name.as_deref())? {
                        println!("Registered {}", recipient.trim());
                    } else {
                        println!("{} was already registered", recipient.trim());
                    }
                }
                RecipientsAction::Remove { recipient } => {
                    if !registry.remove(&recipient)? {
                        anyhow::bail!("{} is not registered", recipient.trim());
                    }
                    println!("Removed {}", recipient.trim());
                }
                RecipientsAction::List => {
                    print!("{}", report::recipients(&registry.list()?));
                }
            }
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> anyhow::Result<FileAlertStore> {
    Ok(FileAlertStore::new(&config.history.dir)?)
}
