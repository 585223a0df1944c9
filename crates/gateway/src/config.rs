use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_MAX_BODY_BYTES: usize = 128 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "keeper-gateway", version, about = "Keeper vault gateway")]
pub struct GatewayConfig {
    /// Address to listen on.
    #[arg(long, env = "RUN_ADDRESS", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// PostgreSQL connection string. Without it records live in memory.
    #[arg(long, env = "DATABASE_URI")]
    pub database_url: Option<String>,

    /// Secret used to sign session tokens.
    #[arg(long, env = "MASTER_KEY", hide_env_values = true, value_parser = non_empty)]
    pub master_key: String,

    /// Directory holding file record payloads.
    #[arg(long, env = "FILES_DIR", default_value = "files")]
    pub files_dir: PathBuf,

    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("must not be empty".into())
    } else {
        Ok(value.to_string())
    }
}
