pub mod loader;
pub mod proxy;
pub mod schema;

pub use loader::{load_from_env_or_file, load_from_path};
pub use proxy::ProxyConfig;
pub use schema::{parse_size, ProxyOptions};
