use envconfig::Envconfig;

use aggregator::config::Config;
use aggregator::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::init_from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = server::serve(config).await {
        tracing::error!(error = %err, "aggregator exited with an error");
        std::process::exit(1);
    }
}
