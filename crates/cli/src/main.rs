use anyhow::Context;
use clap::Parser;
use toolchat::agent::{ChatSession, SessionOptions};
use toolchat::llm::OpenAiClient;
use toolchat::tools::{McpToolProvider, ProviderCommand};

#[derive(Parser)]
#[command(name = "toolchat", version)]
#[command(about = "Chat with a language model that can call tools from a local provider process", long_about = None)]
struct Cli {
    /// Config file path (default: TOOLCHAT_CONFIG_PATH or ~/.toolchat/config.json)
    #[arg(long, short, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Tool provider to start: an executable (e.g. toolchat-provider), or a script when provider.launcher is configured.
    #[arg(value_name = "PROVIDER")]
    provider: String,

    /// Extra arguments passed to the provider.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    provider_args: Vec<String>,
}

#[tokio::main]
async fn main() {
    // .env first so it can also carry RUST_LOG.
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = dotenv {
        log::debug!("no .env loaded: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run_chat(cli).await {
        log::error!("chat failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_chat(cli: Cli) -> anyhow::Result<()> {
    let (config, path) = toolchat::config::load_config(cli.config)?;
    log::debug!("config: {}", path.display());
    let settings = toolchat::config::resolve_llm_settings(&config);
    let backend = OpenAiClient::from_settings(&settings);

    let command = ProviderCommand::new(
        config.provider.launcher.as_deref(),
        &cli.provider,
        &cli.provider_args,
    );
    let provider = McpToolProvider::spawn(&command)
        .await
        .with_context(|| format!("connecting to tool provider '{}'", command))?;

    let mut session = ChatSession::connect(
        backend,
        provider,
        SessionOptions {
            model: settings.model.clone(),
            retention: config.transcript.retention,
        },
    )
    .await
    .context("listing provider tools")?;

    let names: Vec<&str> = session.tools().iter().map(|t| t.name.as_str()).collect();
    println!("Available tools: {}", names.join(", "));

    let result = session
        .run_session(std::io::stdin().lock(), std::io::stdout())
        .await;

    let (_, provider) = session.into_parts();
    if let Err(e) = provider.shutdown().await {
        log::debug!("provider shutdown: {}", e);
    }
    result?;
    Ok(())
}
