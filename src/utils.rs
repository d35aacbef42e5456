use std::fs::read_to_string;

use tracing::{error, warn};

/// Reads `<name>.toml` from `path`, the working directory or
/// `/etc/livewatch/`, falling back to defaults.
pub fn load<T>(name: &str, path: Option<String>) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let explicit = path.is_some();
    let content = read_to_string(path.unwrap_or(format!("{name}.toml")))
        .or_else(|_| read_to_string(format!("/etc/livewatch/{name}.toml")));
    let content = match content {
        Ok(content) => content,
        Err(err) => {
            if explicit {
                warn!("config file unreadable, using defaults: {}", err);
            }
            return Default::default();
        }
    };
    parse(&content)
}

pub fn parse<T>(content: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match toml::from_str(content) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("config load error: {}", err);
            Default::default()
        }
    }
}
