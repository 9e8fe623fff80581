//! Quillc - the Quill driver.
//!
//! Ties the pipeline together for hosts:
//! - `Session`: parse, optional constant folding, incremental compilation
//!   into one growing program image, and execution against a persistent
//!   `Context`.
//! - `diagnostic`: source snippets for parse errors.
//! - `commands`: the subcommands of the `quill` binary.

pub mod commands;
pub mod diagnostic;
mod host;
mod session;

pub use session::{Session, SessionConfig, SessionError};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Does nothing unless `RUST_LOG` is set, so normal runs pay nothing.
/// Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        }
    });
}
