use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use wvscout_config::{ConfigLoader, ScoutConfig};

mod devices;
mod discover;

/// 🔎 wvscout: find and describe Android hybrid webviews
#[derive(Parser)]
#[command(name = "wvscout", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to wvscout.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Target device serial (overrides config and ANDROID_SERIAL)
    #[arg(short, long, global = true)]
    serial: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Per-run overrides of the `[discovery]` section.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct DiscoveryArgs {
    /// Only look at this abstract socket (without '@')
    #[arg(long)]
    socket: Option<String>,

    /// Keep webviews that report zero pages
    #[arg(long)]
    no_pages: bool,

    /// Skip /json/version collection
    #[arg(long)]
    no_details: bool,

    /// First local port to try for forwarding
    #[arg(long)]
    port: Option<u16>,

    /// Keep polling for webviews for this many milliseconds
    #[arg(long)]
    wait_ms: Option<u64>,
}

impl DiscoveryArgs {
    /// Layer the flags over the loaded config and validate the result.
    fn apply(&self, config: &mut ScoutConfig) -> wvscout_core::Result<()> {
        let discovery = &mut config.discovery;
        if let Some(ref socket) = self.socket {
            discovery.device_socket = Some(socket.clone());
        }
        if self.no_pages {
            discovery.ensure_webviews_have_pages = false;
        }
        if self.no_details {
            discovery.enable_details_collection = false;
        }
        if let Some(port) = self.port {
            discovery.devtools_port = Some(port);
        }
        if let Some(ms) = self.wait_ms {
            discovery.wait_for_webview_ms = ms;
        }
        ConfigLoader::check(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List attached Android devices
    Devices {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available contexts (NATIVE_APP first, then webviews)
    Contexts {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every discovered webview with its details and degradations
    Webviews {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compose Chromedriver capabilities for a context
    Caps {
        /// Context name, e.g. WEBVIEW_com.example.app, CHROMIUM or WEBVIEW
        context: String,

        /// JSON file with capability overrides (chromeOptions, appPackage, ...)
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Take the Android package from the context name instead of CDP
        #[arg(long)]
        extract_package: bool,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub async fn run(self) -> wvscout_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let mut config = config_loader.get();
        if let Some(serial) = self.serial {
            config.device.serial = Some(serial);
        }

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug".to_string()
        } else if self.quiet {
            "error".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone())
        };
        init_tracing(&config.logging.format, &log_level);

        match self.command {
            Commands::Devices { json } => devices::cmd_devices(&config, json).await,
            Commands::Contexts { discovery, json } => {
                discovery.apply(&mut config)?;
                discover::cmd_contexts(&config, json).await
            }
            Commands::Webviews { discovery, json } => {
                discovery.apply(&mut config)?;
                discover::cmd_webviews(&config, json).await
            }
            Commands::Caps {
                context,
                overrides,
                extract_package,
                discovery,
            } => {
                discovery.apply(&mut config)?;
                discover::cmd_caps(&config, &context, overrides.as_deref(), extract_package).await
            }
            Commands::Config { json } => Self::cmd_config(&config, json),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    fn cmd_config(config: &ScoutConfig, json: bool) -> wvscout_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config)
                    .map_err(|e| wvscout_core::ScoutError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> wvscout_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "wvscout", &mut std::io::stdout());
        Ok(())
    }
}

/// `RUST_LOG` wins over the resolved level.
fn init_tracing(format: &str, log_level: &str) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level))
    };
    // Logs go to stderr so --json output stays machine readable.
    match format {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .json()
            .with_target(true)
            .init(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .init(),
    }
}
