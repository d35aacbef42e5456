use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured directives.
pub fn set(directives: String) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .init();
}

pub fn directives(level: &str) -> String {
    format!("livewatch={level},livestream={level},reqwest=warn,hyper=warn")
}
