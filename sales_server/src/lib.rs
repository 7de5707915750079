//! # Sales Server
//!
//! HTTP API for training daily sales forecasts from uploaded files and
//! serving predictions over date ranges.
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/` | welcome message |
//! | GET | `/health` | liveness and model status |
//! | POST | `/upload` | multipart `file` upload, trains a model |
//! | POST | `/predict` | `{start_date, end_date}` to daily predictions |
//! | GET | `/model` | metadata of the served model |

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::{ConfigError, ServerConfig};
pub use crate::error::ServerError;
pub use crate::routes::build_router;
pub use crate::state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// Falls back to the default filter when `filter` does not parse. Calling it
/// again after a subscriber is installed has no effect.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
