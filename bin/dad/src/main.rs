//! DA reference server and client CLI.
//!
//! This binary can:
//! - Serve the in-memory reference DA store over JSON-RPC
//! - Generate auth secrets and issue permission tokens
//! - Submit, fetch, list and validate blobs against a running server

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use da::{DataAvailability, SubmitOptions};
use da_proxy::{
    AuthDisabled, AuthGate, ClientConfig, DaClient, DaServer, Permission, ServerConfig,
    TokenIssuer, ALL_PERMS, DEFAULT_URL,
};
use dummy_da::{DummyDa, DummyDaConfig, DEFAULT_MAX_BLOB_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "dad")]
#[command(about = "Reference data availability server and client")]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the in-memory DA store over JSON-RPC
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:7980")]
        bind: SocketAddr,
        /// Accept every request without a token
        #[arg(long)]
        auth_disabled: bool,
        /// Hex-encoded 32-byte token secret (random if omitted)
        #[arg(long, env = "DA_AUTH_SECRET")]
        secret: Option<String>,
        /// Largest accepted blob in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_BLOB_SIZE)]
        max_blob_size: u64,
        /// Reject heights more than this many blocks ahead of the store
        #[arg(long)]
        future_height_tolerance: Option<u64>,
        /// Per-request deadline in milliseconds
        #[arg(long)]
        request_timeout_ms: Option<u64>,
    },
    /// Generate a new token secret
    Keygen,
    /// Issue a token for a secret
    Token {
        /// Hex-encoded 32-byte token secret
        #[arg(long, env = "DA_AUTH_SECRET")]
        secret: String,
        /// Comma-separated permissions (public,read,write,admin)
        #[arg(long, value_delimiter = ',', default_value = "public,read,write")]
        perms: Vec<Permission>,
    },
    /// Submit blobs
    Submit {
        #[command(flatten)]
        remote: Remote,
        /// Treat blobs as hex instead of UTF-8 text
        #[arg(long)]
        hex: bool,
        /// Hex-encoded namespace
        #[arg(long)]
        namespace: Option<String>,
        /// Gas price hint (0 lets the backend choose)
        #[arg(long, default_value_t = 0.0)]
        gas_price: f64,
        /// Blobs to submit
        #[arg(required = true)]
        blobs: Vec<String>,
    },
    /// Fetch blobs by hex ID
    Get {
        #[command(flatten)]
        remote: Remote,
        /// Hex-encoded IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List IDs included at a height
    Ids {
        #[command(flatten)]
        remote: Remote,
        /// Height to list
        height: u64,
    },
    /// Validate inclusion proofs
    Validate {
        #[command(flatten)]
        remote: Remote,
        /// Hex-encoded IDs
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
        /// Hex-encoded proofs, one per ID
        #[arg(long, value_delimiter = ',', required = true)]
        proofs: Vec<String>,
    },
    /// Show the maximum blob size
    MaxBlobSize {
        #[command(flatten)]
        remote: Remote,
    },
}

/// Connection options shared by client commands.
#[derive(clap::Args)]
struct Remote {
    /// DA server URL
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,
    /// Bearer token
    #[arg(long, env = "DA_AUTH_TOKEN")]
    token: Option<String>,
    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Remote {
    fn client(self) -> Result<DaClient> {
        let client = DaClient::from_config(ClientConfig {
            url: self.url,
            timeout: self.timeout_ms.map(Duration::from_millis),
            token: self.token,
        })?;
        Ok(client)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve {
            bind,
            auth_disabled,
            secret,
            max_blob_size,
            future_height_tolerance,
            request_timeout_ms,
        } => {
            let store = DummyDaConfig {
                max_blob_size,
                future_height_tolerance,
            };
            let server = ServerConfig {
                request_timeout: request_timeout_ms.map(Duration::from_millis),
                ..Default::default()
            };
            run_server(bind, store, server, auth_disabled, secret).await?;
        }
        Commands::Keygen => {
            let issuer = TokenIssuer::generate();
            println!("{}", hex::encode(issuer.secret()));
        }
        Commands::Token { secret, perms } => {
            let issuer = TokenIssuer::from_secret(parse_secret(&secret)?);
            println!("{}", issuer.issue(&perms)?);
        }
        Commands::Submit {
            remote,
            hex,
            namespace,
            gas_price,
            blobs,
        } => {
            let blobs = blobs
                .iter()
                .map(|b| {
                    if hex {
                        decode_hex(b)
                    } else {
                        Ok(b.as_bytes().to_vec())
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            let options = SubmitOptions {
                gas_price,
                namespace: namespace
                    .as_deref()
                    .map(decode_hex)
                    .transpose()?
                    .unwrap_or_default(),
            };
            submit_blobs(remote.client()?, blobs, options).await?;
        }
        Commands::Get { remote, ids } => {
            let ids = ids.iter().map(|id| decode_hex(id)).collect::<Result<Vec<_>>>()?;
            let blobs = remote.client()?.get(&ids).await?;
            for (id, blob) in ids.iter().zip(&blobs) {
                println!("{}: {}", hex::encode(id), hex::encode(blob));
            }
        }
        Commands::Ids { remote, height } => {
            let ids = remote.client()?.get_ids(height).await?;
            println!("Height {}: {} blob(s)", height, ids.len());
            for id in ids {
                println!("  {}", hex::encode(id));
            }
        }
        Commands::Validate {
            remote,
            ids,
            proofs,
        } => {
            let ids = ids.iter().map(|id| decode_hex(id)).collect::<Result<Vec<_>>>()?;
            let proofs = proofs
                .iter()
                .map(|p| decode_hex(p))
                .collect::<Result<Vec<_>>>()?;
            let results = remote.client()?.validate(&ids, &proofs).await?;
            for (id, valid) in ids.iter().zip(results) {
                println!("{}: {}", hex::encode(id), valid);
            }
        }
        Commands::MaxBlobSize { remote } => {
            println!("{}", remote.client()?.max_blob_size().await?);
        }
    }

    Ok(())
}

async fn run_server(
    bind: SocketAddr,
    store: DummyDaConfig,
    config: ServerConfig,
    auth_disabled: bool,
    secret: Option<String>,
) -> Result<()> {
    info!("Starting DA server with config: {:?}", store);

    let gate: Arc<dyn AuthGate> = if auth_disabled {
        warn!("Authentication disabled, every caller has full access");
        Arc::new(AuthDisabled)
    } else {
        let issuer = match secret {
            Some(secret) => TokenIssuer::from_secret(parse_secret(&secret)?),
            None => {
                let issuer = TokenIssuer::generate();
                info!("Generated token secret: {}", hex::encode(issuer.secret()));
                issuer
            }
        };
        info!("Admin token: {}", issuer.issue(ALL_PERMS)?);
        Arc::new(issuer.gate())
    };

    let handle = DaServer::new(Arc::new(DummyDa::with_config(store)))
        .with_auth(gate)
        .with_config(config)
        .start(bind)
        .await?;

    info!("Serving on {}", handle.url());
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.stop().await?;

    Ok(())
}

async fn submit_blobs(client: DaClient, blobs: Vec<Vec<u8>>, options: SubmitOptions) -> Result<()> {
    let result = client.submit(&blobs, Some(&options)).await?;

    println!("Submitted {} blob(s):", result.ids.len());
    for (id, proof) in result.ids.iter().zip(&result.proofs) {
        println!("  ID: {}", hex::encode(id));
        println!("  Proof: {}", hex::encode(proof));
    }
    println!(
        "{}",
        serde_json::json!({
            "ids": result.ids.iter().map(hex::encode).collect::<Vec<_>>(),
            "proofs": result.proofs.iter().map(hex::encode).collect::<Vec<_>>(),
        })
    );

    Ok(())
}

// Helper functions

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim_start_matches("0x")).with_context(|| format!("invalid hex: {}", s))
}

fn parse_secret(s: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex(s)?;
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("secret must be 32 bytes"))
}
