mod auth;
mod config;
mod outcome;
mod upstream;
mod web;

use log::{debug, error, info};
use std::env;
use std::sync::Arc;

use config::Config;
use upstream::{AdminSession, ZimbraClient};
use web::{AppState, RequestGate};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    debug!("[main] mailgateway starting, command={}", command);

    match command {
        "serve" => {
            let config = match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    error!("[main] configuration error: {}", e);
                    std::process::exit(1);
                }
            };
            info!("[main] serve: {:?}", config);

            let http = match reqwest::Client::builder()
                .timeout(config.upstream_timeout)
                .danger_accept_invalid_certs(config.insecure_tls)
                .build()
            {
                Ok(http) => http,
                Err(e) => {
                    error!("[main] failed to build HTTP client: {}", e);
                    std::process::exit(1);
                }
            };
            if config.insecure_tls {
                info!("[main] upstream certificate validation disabled");
            }

            let sessions = Arc::new(AdminSession::new(
                http.clone(),
                &config.upstream_url,
                &config.admin_user,
                &config.admin_password,
            ));
            let api = Arc::new(ZimbraClient::new(
                http,
                &config.upstream_url,
                &config.web_client_url,
                sessions.clone(),
            ));

            let state = AppState {
                api,
                sessions,
                gate: RequestGate::new(config.hmac_key.clone(), config.hmac_window),
            };

            web::start_server(state, config.port).await;
        }
        "sign" => {
            let key = match env::var("HMAC_KEY") {
                Ok(key) if !key.is_empty() => key,
                _ => {
                    error!("[sign] HMAC_KEY is not set");
                    std::process::exit(1);
                }
            };
            let timestamp = match args.get(2).map(|s| s.parse::<i64>()) {
                Some(Ok(ts)) => ts,
                None => chrono::Utc::now().timestamp(),
                Some(Err(_)) => {
                    error!("[sign] timestamp must be an integer, got {:?}", args[2]);
                    std::process::exit(1);
                }
            };
            let fields: Vec<&str> = args.iter().skip(3).map(|s| s.as_str()).collect();
            debug!("[sign] timestamp={} fields={}", timestamp, fields.len());

            println!("timestamp={}", timestamp);
            println!("hmac_sign={}", auth::sign(&fields, timestamp, key.as_bytes()));
        }
        _ => {
            println!("Mailgateway - signed HTTP gateway for the groupware admin API");
            println!();
            println!("Usage:");
            println!("  mailgateway serve                        Start the gateway");
            println!("  mailgateway sign [timestamp] [fields..]  Print the signature for a request");
            println!();
            println!("Environment variables:");
            println!("  UPSTREAM_URL           Admin service base URL (required)");
            println!("  ADMIN_USER             Admin account used for upstream sessions (required)");
            println!("  ADMIN_PASSWORD         Password of ADMIN_USER (required)");
            println!("  HMAC_KEY               Secret shared with callers (required)");
            println!("  HMAC_WINDOW_SECS       Allowed timestamp skew (default: 30)");
            println!("  GATEWAY_PORT           Listening port (default: 5000)");
            println!("  UPSTREAM_TIMEOUT_SECS  Upstream request timeout (default: 10)");
            println!("  UPSTREAM_INSECURE_TLS  Skip certificate checks (default: false)");
            println!("  WEB_CLIENT_URL         Base URL for preauth links (default: UPSTREAM_URL)");
        }
    }
}
