mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use roles::RoleValues;
use tracing::debug;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, Grant};
use error::{Error, Result};

const CONFIG_FILE: &str = "roles.toml";

#[derive(Parser)]
#[command(name = "rolecheck")]
#[command(about = "Dry-run role-based permission specs", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file with [roles] and [permissions] tables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log evaluation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a named permission spec from the config
    Check {
        /// Permission name
        name: String,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Evaluate an ad-hoc permission spec (JSON, or a bare role name)
    Eval {
        /// e.g. '{"every":["member"],"none":"banned"}'
        spec: String,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// List configured permission specs
    List,
}

#[derive(Args)]
struct Overrides {
    /// Grant a role; VALUE is parsed as JSON and defaults to true
    #[arg(short = 'g', long = "grant", value_name = "ROLE[=VALUE]")]
    grants: Vec<Grant>,

    /// Deny a role
    #[arg(short = 'd', long = "deny", value_name = "ROLE")]
    denies: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::resolve(cli.config.as_deref(), Path::new(CONFIG_FILE))?;

    match cli.command {
        Commands::Check { name, overrides } => {
            config.apply_overrides(&overrides.grants, &overrides.denies);
            cmd_check(&config, &name).await
        }
        Commands::Eval { spec, overrides } => {
            config.apply_overrides(&overrides.grants, &overrides.denies);
            cmd_eval(&config, &spec).await
        }
        Commands::List => cmd_list(&config),
    }
}

async fn cmd_check(config: &Config, name: &str) -> Result<()> {
    if config.permissions.get(name).is_none() {
        return Err(Error::UnknownPermission {
            name: name.to_string(),
        });
    }

    let provider = config.provider();
    let granted = provider.validate_named(&config.permissions, name, &[]).await?;
    print_granted(&granted)
}

async fn cmd_eval(config: &Config, raw: &str) -> Result<()> {
    let spec = config::parse_spec(raw)?;
    debug!(?spec, "evaluating ad-hoc spec");

    let provider = config.provider();
    let granted = provider.validate(spec, &[]).await?;
    print_granted(&granted)
}

fn cmd_list(config: &Config) -> Result<()> {
    if config.permissions.is_empty() {
        println!("No permissions defined.");
        return Ok(());
    }

    println!("{:<24}  SPEC", "NAME");
    println!("{}", "-".repeat(72));

    for (name, permissions) in config.permissions.iter() {
        println!("{name:<24}  {}", serde_json::to_string(permissions)?);
    }

    Ok(())
}

fn print_granted(granted: &RoleValues) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(granted)?);
    Ok(())
}
