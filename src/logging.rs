//! Logging setup.
//!
//! The entry point calls [`init`] once and hands the returned [`LogHandle`]
//! to every component it builds. Components never touch global logger
//! state; they derive their own span from the handle and emit events
//! inside it.

use anyhow::{Context, Result};
use tracing::{Span, info, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_DIRECTIVES: &str = "user_game_api=debug,tower_http=info";

#[derive(Debug, Clone)]
pub struct LogHandle {
    root: Span,
}

impl LogHandle {
    /// A handle whose spans are never recorded, for tests and embedding.
    pub fn disabled() -> Self {
        Self { root: Span::none() }
    }

    /// Span for one named component, parented to the process span.
    pub fn component(&self, name: &'static str) -> Span {
        info_span!(parent: &self.root, "component", name)
    }

    pub fn root(&self) -> &Span {
        &self.root
    }

    pub fn shutdown(self) {
        self.root.in_scope(|| info!("logger shutdown"));
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `default_directives`.
pub fn init(default_directives: &str) -> Result<LogHandle> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to install tracing subscriber")?;

    let root = info_span!("user_game_api", pid = std::process::id());
    root.in_scope(|| info!("logger init"));
    Ok(LogHandle { root })
}
