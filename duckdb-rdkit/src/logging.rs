//! Log output for the loaded extension.

use crate::config::ExtensionConfig;

/// Install a stderr `tracing` subscriber.
///
/// Does nothing if the host process already installed a global subscriber.
pub fn init(config: &ExtensionConfig) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Global tracing subscriber already set; keeping it");
    }
}
