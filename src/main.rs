use clap::Parser;
use http_client_sync_ssl::{FetchConfig, Fetcher};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Performs an HTTPS GET and prints the response
///
/// Only positionals are accepted; anything that starts with `-` is taken as
/// a value. Log verbosity comes from `RUST_LOG` (default `warn`).
#[derive(Parser, Debug)]
#[command(
    name = "http-client-sync-ssl",
    disable_help_flag = true,
    disable_version_flag = true,
    override_usage = concat!(
        "http-client-sync-ssl <HOST> <PORT> <TARGET> [VERSION]\n\n",
        "Example:\n",
        "    http-client-sync-ssl www.example.com 443 /\n",
        "    http-client-sync-ssl www.example.com 443 / 1.0",
    )
)]
struct Args {
    /// Server host name or address
    #[arg(allow_hyphen_values = true)]
    host: String,

    /// Port number, or "https"
    #[arg(allow_hyphen_values = true)]
    port: String,

    /// Request target, e.g. "/"
    #[arg(allow_hyphen_values = true)]
    target: String,

    /// HTTP version: 1.0 or 1.1 (default)
    #[arg(value_name = "VERSION", allow_hyphen_values = true)]
    http_version: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging unavailable: {}", e);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = FetchConfig::new(args.host, args.port, args.target, args.http_version.as_deref());
    tracing::debug!(?config, "starting fetch");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match Fetcher::new(config).run(&mut out) {
        Ok(outcome) => {
            tracing::info!(
                status = outcome.response.status().code(),
                consumed = outcome.consumed,
                "fetch complete"
            );
            let _ = out.flush();
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = out.flush();
            tracing::debug!(category = %e.category(), "fetch failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
