use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs the global logger.
///
/// `verbose` lowers the default filter to debug; `RUST_LOG` still wins.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let env = Env::default().default_filter_or(level.to_string());
    let _ = Builder::from_env(env).try_init();
}
