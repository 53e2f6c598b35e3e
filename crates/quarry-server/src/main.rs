use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::{Fatal, Info};
use quarry_server::launch;
use quarry_server::server::Server;

#[tokio::main]
async fn main() {
    let path = launch::config_path(
        std::env::args().nth(1),
        std::env::var(launch::CONFIG_ENV).ok(),
    );
    let config = match launch::load_config(path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            log(format!("{}", err), Fatal);
            std::process::exit(1);
        }
    };
    quarry_logger::init(launch::log_level(&config));

    log("Quarry init".to_owned(), Info);
    let server = match Server::bind(launch::build_context(config)).await {
        Ok(server) => server,
        Err(err) => {
            log(format!("Failed to bind: {}", err), Fatal);
            std::process::exit(1);
        }
    };
    server.run().await;
}
