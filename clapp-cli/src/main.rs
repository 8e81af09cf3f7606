//! clapp: manage Cloudistics applications from the command line.
//!
//! Mutating subcommands print the reconcile outcome as JSON and exit
//! non-zero on failure. `--check` performs lookups only and reports the
//! change that a real run would make.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tabled::{Table, Tabled};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clapp_api::{ClientConfig, HttpProvider};
use clapp_core::{
    ActionKind, Application, ApplicationSpec, NicKind, NicSpec, Outcome, Provider, Reconciler,
    WaitPolicy, find_by_name,
};

/// Cloudistics application manager
#[derive(Parser)]
#[command(name = "clapp", version, about)]
struct Cli {
    /// API endpoint
    #[arg(long, global = true, env = "CLOUDISTICS_ENDPOINT")]
    endpoint: Option<String>,

    /// API token
    #[arg(long, global = true, env = "CLOUDISTICS_API_KEY", hide_env_values = true)]
    token: Option<String>,

    /// Profile file (default: ~/.cloudistics.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report what would change without mutating anything
    #[arg(long, global = true)]
    check: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WaitArgs {
    /// Return as soon as the action is issued, without polling it
    #[arg(long)]
    no_wait: bool,

    /// Seconds to wait for the action to reach a terminal status
    #[arg(long)]
    wait_timeout: Option<u64>,
}

impl WaitArgs {
    fn policy(&self, base: WaitPolicy) -> WaitPolicy {
        let mut policy = base;
        if self.no_wait {
            policy.wait = false;
        }
        if let Some(secs) = self.wait_timeout {
            policy = policy.with_timeout(Duration::from_secs(secs));
        }
        policy
    }
}

#[derive(Args)]
struct SpecArgs {
    /// Application name
    name: String,

    /// Description of the application
    #[arg(long)]
    description: Option<String>,

    /// Count of vCPUs
    #[arg(long)]
    vcpus: Option<u32>,

    /// Memory in bytes
    #[arg(long)]
    memory: Option<u64>,

    /// Template to create the application from
    #[arg(long)]
    template_name: Option<String>,

    /// Category to create the application in
    #[arg(long)]
    category_name: Option<String>,

    /// Data center to place the application in
    #[arg(long)]
    data_center_name: Option<String>,

    /// Migration zone for the application
    #[arg(long)]
    migration_zone_name: Option<String>,

    /// Flash pool backing the application's storage
    #[arg(long)]
    flash_pool_name: Option<String>,

    /// NIC descriptor: name=...,type=vnet|vlan[,vnet=...][,firewall=...]
    /// (repeatable)
    #[arg(long = "nic", value_parser = parse_nic)]
    nics: Vec<NicSpec>,

    /// Tag to attach (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl From<SpecArgs> for ApplicationSpec {
    fn from(args: SpecArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            vcpus: args.vcpus,
            memory: args.memory,
            template_name: args.template_name,
            category_name: args.category_name,
            data_center_name: args.data_center_name,
            migration_zone_name: args.migration_zone_name,
            flash_pool_name: args.flash_pool_name,
            nics: args.nics,
            tags: args.tags,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an application unless one with the same name exists
    Apply {
        #[command(flatten)]
        spec: SpecArgs,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete an application by name
    Delete {
        /// Application name
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Start an application
    Start {
        /// Application name
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Stop an application (graceful shutdown)
    Stop {
        /// Application name
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Restart an application
    Restart {
        /// Application name
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Pause an application
    Pause {
        /// Application name
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Resume a paused application
    Resume {
        /// Application name
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// List applications
    List,

    /// Show one application as JSON
    Get {
        /// Application name
        name: String,
    },
}

fn parse_nic(s: &str) -> Result<NicSpec, String> {
    let mut nic = NicSpec {
        name: String::new(),
        kind: NicKind::VirtualNetworking,
        vnet_name: None,
        firewall_name: None,
    };

    for part in s.split(',') {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{part}'"))?;
        let value = value.trim();
        match key.trim() {
            "name" => nic.name = value.to_string(),
            "type" => {
                nic.kind = match value {
                    "vnet" | "Virtual Networking" => NicKind::VirtualNetworking,
                    "vlan" | "VLAN" => NicKind::Vlan,
                    other => return Err(format!("unknown NIC type '{other}'")),
                }
            }
            "vnet" => nic.vnet_name = Some(value.to_string()),
            "firewall" => nic.firewall_name = Some(value.to_string()),
            other => return Err(format!("unknown NIC field '{other}'")),
        }
    }

    if nic.name.is_empty() {
        return Err("NIC descriptor needs a name".to_string());
    }
    Ok(nic)
}

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "VCPUS")]
    vcpus: String,
    #[tabled(rename = "MEMORY")]
    memory: String,
    #[tabled(rename = "DATA CENTER")]
    data_center: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<Application> for AppRow {
    fn from(app: Application) -> Self {
        Self {
            name: app.name,
            status: app.status,
            vcpus: app
                .vcpus
                .map_or_else(|| "-".to_string(), |v| v.to_string()),
            memory: app.memory.map_or_else(|| "-".to_string(), format_memory),
            data_center: app.data_center_name.unwrap_or_else(|| "-".to_string()),
            id: app.id,
        }
    }
}

fn format_memory(bytes: u64) -> String {
    const GIB: u64 = 1024 * 1024 * 1024;
    if bytes % GIB == 0 {
        format!("{}GiB", bytes / GIB)
    } else {
        format!("{}MiB", bytes / (1024 * 1024))
    }
}

fn print_outcome(outcome: &Outcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clapp_core=warn,clapp_api=warn,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::resolve(cli.endpoint, cli.token, cli.config)?;
    let provider = HttpProvider::new(config)?;

    match cli.command {
        Commands::List => {
            let applications = provider.list_applications().await?;
            if applications.is_empty() {
                println!("No applications found");
            } else {
                let rows: Vec<AppRow> = applications.into_iter().map(AppRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Get { name } => {
            let application = find_by_name(&provider, &name)
                .await?
                .ok_or_else(|| anyhow!("application not found: {name}"))?;
            println!("{}", serde_json::to_string_pretty(&application)?);
        }

        Commands::Apply { spec, wait } => {
            let policy = wait.policy(WaitPolicy::resource());
            let reconciler = Reconciler::new(provider).with_check_mode(cli.check);
            let spec = ApplicationSpec::from(spec);
            let outcome = reconciler
                .ensure_present(&spec, &policy)
                .await
                .with_context(|| format!("applying application {}", spec.name))?;
            print_outcome(&outcome)?;
        }

        Commands::Delete { name, wait } => {
            let policy = wait.policy(WaitPolicy::resource());
            let reconciler = Reconciler::new(provider).with_check_mode(cli.check);
            let outcome = reconciler
                .ensure_absent(&name, &policy)
                .await
                .with_context(|| format!("deleting application {name}"))?;
            print_outcome(&outcome)?;
        }

        Commands::Start { name, wait } => {
            run_action(provider, cli.check, &name, ActionKind::Start, &wait).await?;
        }
        Commands::Stop { name, wait } => {
            run_action(provider, cli.check, &name, ActionKind::Stop, &wait).await?;
        }
        Commands::Restart { name, wait } => {
            run_action(provider, cli.check, &name, ActionKind::Restart, &wait).await?;
        }
        Commands::Pause { name, wait } => {
            run_action(provider, cli.check, &name, ActionKind::Pause, &wait).await?;
        }
        Commands::Resume { name, wait } => {
            run_action(provider, cli.check, &name, ActionKind::Resume, &wait).await?;
        }
    }

    Ok(())
}

async fn run_action(
    provider: HttpProvider,
    check: bool,
    name: &str,
    action: ActionKind,
    wait: &WaitArgs,
) -> Result<()> {
    let policy = wait.policy(WaitPolicy::action());
    let reconciler = Reconciler::new(provider).with_check_mode(check);
    let outcome = reconciler
        .apply_action(name, action, &policy)
        .await
        .with_context(|| format!("{action} on application {name}"))?;
    print_outcome(&outcome)
}
