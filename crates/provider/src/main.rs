//! toolchat-provider: MCP tool provider on stdin/stdout. Logs go to stderr.

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = toolchat::toolbox::serve_stdio().await {
        log::error!("provider failed: {}", e);
        std::process::exit(1);
    }
}
