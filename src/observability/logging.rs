use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BASE_DIRECTIVES: &str = "funding_matcher=info,tower_http=info,warn";

/// Predicate breakdowns are emitted at debug by the tracing observer.
const DIAGNOSTICS_DIRECTIVE: &str = "funding_matcher::engine::observer=debug";

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(diagnostics: bool) -> String {
    if diagnostics {
        format!("{BASE_DIRECTIVES},{DIAGNOSTICS_DIRECTIVE}")
    } else {
        BASE_DIRECTIVES.to_string()
    }
}

/// Initializes console logging, plus daily-rolling JSON files when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop; keep it alive in `main`.
pub fn init_logging(log_dir: Option<&Path>, diagnostics: bool) -> Option<WorkerGuard> {
    // RUST_LOG wins when set
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(diagnostics)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stdout);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let _ = fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, "funding_matcher.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
