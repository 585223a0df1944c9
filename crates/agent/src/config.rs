use clap::Parser;
use keeper_client_sdk::HttpConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "keeper-agent", version, about = "Keeper vault terminal client")]
pub struct AgentConfig {
    /// Gateway address, `host:port` or a full URL.
    #[arg(long, env = "RUN_ADDRESS", default_value = "localhost:8080")]
    pub server: String,

    /// Directory with per-user encryption keys.
    #[arg(long, env = "KEEPER_KEY_DIR", default_value = "users")]
    pub key_dir: PathBuf,

    /// Where downloaded file records are written.
    #[arg(long, env = "KEEPER_DOWNLOAD_DIR", default_value = "files")]
    pub download_dir: PathBuf,

    #[arg(long, env = "KEEPER_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Send request bodies uncompressed.
    #[arg(long, env = "KEEPER_NO_GZIP")]
    pub no_gzip: bool,

    #[arg(long, env = "KEEPER_LOG_FILE", default_value = "debug.log")]
    pub log_file: PathBuf,
}

impl AgentConfig {
    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            server: self.server.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            gzip_requests: !self.no_gzip,
        }
    }
}
