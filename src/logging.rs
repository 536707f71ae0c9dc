use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise logging at `info`, or `debug` when enabled in the settings file.
/// `RUST_LOG` overrides the level only in debug mode. When `log_file` is
/// given, events are also appended to that file.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Without debug logging the level is forced so a stray `RUST_LOG` in the
    // user's environment cannot make the output verbose.
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_layer = log_file.and_then(|path| {
        let name = path.file_name()?.to_os_string();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let writer = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name.to_string_lossy())
            .build(&dir);
        match writer {
            Ok(writer) => Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Err(e) => {
                eprintln!("failed to open log file in {}: {e}", dir.display());
                None
            }
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
}
