use dotenvy::dotenv;
use log::info;
use trc20_settlement_server::{cli::handle_command_line_args, config::ServerConfig, server::run_gateway};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    handle_command_line_args();
    let config = ServerConfig::from_env_or_default();

    info!("🚀️ Starting settlement gateway. Polling every {}s", config.poll_interval.as_secs());
    match run_gateway(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
