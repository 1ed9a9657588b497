use tracing_subscriber::EnvFilter;

/// Installs a `tracing_subscriber` reading `WSINET_LOG` first, then `RUST_LOG`,
/// then falling back to `info`.
///
/// Meant to be called once by the training script driving the dataset.
pub fn init_tracing() {
    let filter = env_filter();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Like [`init_tracing`] but does not panic if a global subscriber is already set.
pub fn try_init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .is_ok()
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("WSINET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn second_init_is_refused() {
        try_init_tracing();
        assert!(!try_init_tracing());
        tracing::info!("subscriber installed");
    }
}
