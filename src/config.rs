use std::env;
use std::path::PathBuf;

/// Hub configuration, read once at boot from the environment variables named
/// in the external-interfaces table: `PORT`, `SHARED_DIR`, `DATA_DIR`, `LOG_LEVEL`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub shared_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn parse(s: &str) -> LogLevel {
        match s.to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" | "trace" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let shared_dir = env::var("SHARED_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./shared"));
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let log_level = env::var("LOG_LEVEL")
            .map(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Info);

        Config {
            port,
            shared_dir,
            data_dir,
            log_level,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("hub.db")
    }

    /// Emits `msg` to stdout if the configured level is at or below `Debug`.
    pub fn debug(&self, msg: &str) {
        if self.log_level >= LogLevel::Debug {
            println!("🔍 {msg}");
        }
    }
}
