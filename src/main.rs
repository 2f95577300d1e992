use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use dict_completion_server::logging::{init_logger, LoggingOptions};
use dict_completion_server::lsp::backend::{BackendConfig, DictionaryBackend};

/// Dictionary word completion for Markdown, LaTeX and HTML over LSP
#[derive(Parser, Debug)]
#[command(name = "dict-completion-server", version, about)]
struct Args {
    /// Communicate over stdin/stdout (the only transport; accepted for editor compatibility)
    #[arg(long)]
    stdio: bool,

    /// Stderr log level or filter directive (defaults to RUST_LOG, then "info")
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log under the user cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Newline-separated word list replacing the built-in one
    #[arg(long, value_name = "FILE")]
    word_list: Option<PathBuf>,

    /// External user dictionary location (defaults to <config dir>/dict-completion/wordlist)
    #[arg(long, value_name = "FILE")]
    user_dict: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(LoggingOptions {
        no_color: args.no_color,
        log_level: args.log_level.as_deref(),
        file_logging: !args.no_file_logging,
    })
    .context("failed to initialize logging")?;

    let config = BackendConfig::load(args.word_list.as_deref(), args.user_dict)
        .context("failed to load the built-in word list")?;
    info!(
        "Starting {} v{} (user dictionary: {:?})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.user_dict_path
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| DictionaryBackend::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Server stopped");
    Ok(())
}
