use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use dearai::config::AppConfig;
use dearai::endpoints::{router, AppState};
use dearai::OpenAiClient;

#[tokio::main]
async fn main()
{   env_logger::init();

    let config = match AppConfig::from_env()
    {   Ok(config) => config
      , Err(e) => {
          error!("{}", e);
          std::process::exit(2);
        }
    };
    if config.provider.api_key.is_none()
    {   warn!("OPENAI_API_KEY not set; every endpoint will fall back");
    }

    let state = Arc::new(AppState::new(
      OpenAiClient::new(&config.provider),
      Duration::from_secs(config.provider.timeout_secs)
    ));

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await
    {   Ok(listener) => listener
      , Err(e) => {
          error!("Cannot bind {}: {}", config.bind_addr, e);
          std::process::exit(1);
        }
    };
    info!("Listening on {}", config.bind_addr);

    if let Err(e) = axum::serve(listener, router(state)).await
    {   error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
