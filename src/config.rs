use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite { url: String },
    SqliteFile { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub store: StoreBackend,
    pub catalog_path: Option<PathBuf>,
    pub skill_priors_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            store: store_backend_from_env(),
            catalog_path: env_path("COURSE_CATALOG_PATH"),
            skill_priors_path: env_path("SKILL_PRIORS_PATH"),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn store_backend_from_env() -> StoreBackend {
    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|v| v.starts_with("sqlite:"));
    if let Some(url) = database_url {
        return StoreBackend::Sqlite { url };
    }

    let requested = std::env::var("STORE_BACKEND").unwrap_or_default();
    if requested.eq_ignore_ascii_case("sqlite") {
        let path = env_path("SQLITE_PATH")
            .unwrap_or_else(crate::store::SqliteStateStore::default_path);
        return StoreBackend::SqliteFile { path };
    }

    StoreBackend::Memory
}
