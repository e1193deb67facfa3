use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use keyless::{ServerConfig, run};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "keyless-server", about = "Signs TLS handshake digests for keyless terminators")]
struct Args {
    #[clap(long, env = "KEYLESS_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
    /// Request path that answers signing requests.
    #[clap(long, env = "KEYLESS_SIGN_ENDPOINT")]
    sign_endpoint: String,
    /// Request path reserved for decryption (accepted, never performed).
    #[clap(long, env = "KEYLESS_DECRYPT_ENDPOINT")]
    decrypt_endpoint: String,
    /// PKCS#1 "RSA PRIVATE KEY" PEM file.
    #[clap(long, env = "KEYLESS_PRIVATE_KEY")]
    private_key: PathBuf,
    #[clap(long, env = "KEYLESS_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("keyless={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig {
        listen: args.listen,
        sign_endpoint: args.sign_endpoint,
        decrypt_endpoint: args.decrypt_endpoint,
        private_key: args.private_key,
    };

    if let Err(e) = run(config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
