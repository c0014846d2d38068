/// Region sentinel shared by catalog data and queries.
/// On a program it means "available everywhere"; on a query it means "any region".
pub const NATIONWIDE_REGION: &str = "bundesweit";

/// Number of ranked programs returned by default
pub const DEFAULT_MAX_RESULTS: usize = 3;

pub const DEFAULT_CATALOG_PATH: &str = "data/funding_catalog.json";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_DIR: &str = "logs";

// Front-end origins the service has been deployed behind
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://samimagine.github.io"];
