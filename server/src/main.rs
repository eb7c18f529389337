use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use tokio::io::{stdin, stdout};

use tracing_subscriber::EnvFilter;

use clap::Parser;

use bdl_core::config::{DEFAULT_BASE_URL, DEFAULT_LANG};
use bdl_core::{ClientConfig, Dispatcher};
use bdl_server::{stdio, RpcHandler};

/// Serves the BDL operation catalog to a tool-calling client over stdio.
///
/// Usage:
///
/// ```bash
/// bdl-server [--base-url https://bdl.stat.gov.pl/api/v1] [--lang en] [--timeout-secs 30]
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    setup_tracing()?;

    let dispatcher = Arc::new(Dispatcher::from_config(&args.client_config())?);
    let handler = RpcHandler::new(dispatcher);

    stdio::serve(handler, stdin(), stdout(), stdio::MAX_LINE_LENGTH).await?;

    Ok(())
}

#[derive(Parser)]
struct Cli {
    /// Root of the remote statistical API
    #[clap(long, env = "BDL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Response language used when a call does not pass `lang`
    #[clap(long, env = "BDL_LANG", default_value = DEFAULT_LANG)]
    lang: String,

    /// Whole-request timeout for remote calls
    #[clap(long, env = "BDL_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(self.base_url.clone())
            .with_default_lang(self.lang.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn setup_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    tracing::info!("Starting BDL stdio server");

    Ok(())
}
