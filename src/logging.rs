use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initializes `env_logger` once for the binary.
///
/// Defaults to `info`, or `debug` with `debug` set. `RUST_LOG` overrides both.
pub fn init_logger(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env = Env::default().filter_or("RUST_LOG", default_level);

    let mut builder = Builder::from_env(env);
    builder
        .filter_module("symphonia_core", LevelFilter::Warn)
        .filter_module("symphonia_bundle_mp3", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    if builder.try_init().is_err() {
        log::debug!("Logger was already initialized");
    }
}
