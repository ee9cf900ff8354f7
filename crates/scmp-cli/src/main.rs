//! CLI for the SCMP diagnostic tool.

mod resolver;
mod runner;
mod transport;

use clap::{Args, Parser, Subcommand};
use scmp_core::{validate_configuration, ConfigError, ScmpConfig, UdpAddr, DEFAULT_MTU};
use scmp_proto::IA;
use std::fmt::Display;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

/// SCMP diagnostic tool.
#[derive(Parser, Debug)]
#[command(name = "scmp")]
#[command(version)]
#[command(about = "SCMP diagnostic tool for path-aware networks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send SCMP echo requests to a remote host.
    Echo(EchoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EchoArgs {
    /// Remote address, ISD-AS,[IP].
    #[arg(required = true)]
    pub remote: String,

    /// Local ISD-AS.
    #[arg(long = "local-ia")]
    pub local_ia: String,

    /// Local IP address; discovered from the routing table if omitted.
    #[arg(long)]
    pub local: Option<String>,

    /// Number of echo requests (0 = as many as allowed).
    #[arg(short, long, default_value = "0")]
    pub count: u32,

    /// Filler bytes per request.
    #[arg(short = 's', long = "payload-size", default_value = "0")]
    pub payload_size: usize,

    /// Interval between requests in milliseconds (0 = burst).
    #[arg(short, long, default_value = "1000")]
    pub interval: u64,

    /// Time to wait for replies in milliseconds.
    #[arg(short, long, default_value = "2000")]
    pub timeout: u64,

    /// Choose the path interactively.
    #[arg(long)]
    pub interactive: bool,

    /// Raw path to the remote AS, hex encoded. May be repeated.
    #[arg(long = "path", value_name = "HEX")]
    pub paths: Vec<String>,

    /// Underlay address of the first hop.
    #[arg(long = "next-hop")]
    pub next_hop: Option<SocketAddr>,

    /// Path MTU in bytes.
    #[arg(long, default_value_t = DEFAULT_MTU)]
    pub mtu: u16,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl EchoArgs {
    /// Convert CLI args to an ScmpConfig.
    fn to_config(&self) -> Result<ScmpConfig, ConfigError> {
        let local_ia: IA = self
            .local_ia
            .parse::<IA>()
            .map_err(|e| ConfigError::InvalidLocalIa {
                ia: self.local_ia.clone(),
                reason: e.to_string(),
            })?;
        let mut remote: UdpAddr = self.remote.parse()?;
        remote.next_hop = self.next_hop;

        Ok(ScmpConfig {
            count: self.count,
            payload_size: self.payload_size,
            interval: Duration::from_millis(self.interval),
            timeout: Duration::from_millis(self.timeout),
            interactive: self.interactive,
            local_ip: self.local.clone(),
            ..ScmpConfig::new(local_ia, remote)
        })
    }
}

fn fatal(msg: impl Display) -> ExitCode {
    eprintln!("CRIT: {}", msg);
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Echo(args) => {
            let config = match args.to_config().and_then(|c| validate_configuration(&c)) {
                Ok(c) => c,
                Err(e) => return fatal(e),
            };

            tracing::info!(
                remote = %config.remote,
                count = config.count,
                strategy = %config.strategy,
                "Starting echo"
            );

            match runner::run_echo(&args, config).await {
                Ok(summary) => {
                    if args.json {
                        match summary.to_json() {
                            Ok(json) => println!("{}", json),
                            Err(e) => return fatal(format!("Failed to serialize summary: {}", e)),
                        }
                    } else {
                        println!("{}", summary);
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => fatal(e),
            }
        }
    }
}
