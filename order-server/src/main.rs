use order_server::{init_logger_with_file, print_banner, Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    print_banner();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        printer = %config.printer_backend,
        "Starting order server"
    );

    let state = ServerState::initialize(&config);
    Server::new(state).run().await
}
