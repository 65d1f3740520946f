//! Telemetry helpers for hosts embedding `oxide-hooks`.
//!
//! Everything in this crate logs through `tracing`: lifecycle transitions at
//! `debug`, event routing at `trace`, errors handed to the host at `warn` and
//! rejected specifications at `error`. Hosts either call one of the
//! initializers below or install their own subscriber (in a browser,
//! `tracing-wasm` forwards to the developer console).

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_TRACING_FILTER: &str = "oxide_hooks=info";

/// Installs a compact fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_TRACING_FILTER`].
///
/// Returns `false` when the `telemetry` feature is disabled or a global
/// subscriber is already set.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_TRACING_FILTER)
}

/// Like [`init_default_tracing`], with `fallback` as the filter directive
/// when `RUST_LOG` is unset, e.g. `"oxide_hooks=trace"` to follow routing.
///
/// An unparsable `fallback` leaves the subscriber uninstalled.
#[must_use]
pub fn init_tracing(fallback: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => match EnvFilter::try_new(fallback) {
                Ok(filter) => filter,
                Err(_) => return false,
            },
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback;
        false
    }
}
