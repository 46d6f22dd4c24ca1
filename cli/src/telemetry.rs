use std::{fs::File, path::Path};

use pprof::{ProfilerGuard, ProfilerGuardBuilder};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the tracing subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = fmt::layer().with_target(false);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Start a CPU profiler when a flamegraph destination is configured.
pub fn start_profiler(output: Option<&Path>) -> Option<ProfilerGuard<'static>> {
    if output.is_none() {
        return None;
    }
    match ProfilerGuardBuilder::default()
        .frequency(1000)
        .blocklist(&["libc", "libpthread", "libgcc", "libm"])
        .build()
    {
        Ok(guard) => Some(guard),
        Err(error) => {
            warn!(%error, "cpu profiler unavailable");
            None
        }
    }
}

/// Persist the collected CPU profile as a flamegraph.
pub fn write_profile(guard: ProfilerGuard<'_>, output_path: impl AsRef<Path>) {
    let output_path = output_path.as_ref();
    let written = guard
        .report()
        .build()
        .ok()
        .and_then(|report| {
            File::create(output_path)
                .ok()
                .map(|mut file| report.flamegraph(&mut file).is_ok())
        })
        .unwrap_or(false);
    if !written {
        warn!(path = %output_path.display(), "failed to write cpu profile");
    }
}
