use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// The filter follows `env_logger` syntax (e.g. `"info"` or `"tutorial_core=debug"`). When no
/// filter is given, `RUST_LOG` is consulted, then `info` is used. GPU backend crates are capped
/// at `warn` unless the filter names them explicitly.
///
/// Subsequent calls are ignored.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(log::LevelFilter::Info)
            .filter_module("wgpu_core", log::LevelFilter::Warn)
            .filter_module("wgpu_hal", log::LevelFilter::Warn)
            .filter_module("naga", log::LevelFilter::Warn);

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        }

        // Tests may install their own logger first.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}
