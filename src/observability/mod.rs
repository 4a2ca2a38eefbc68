//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via `metrics`)
//!
//! Consumers:
//!     → stdout (JSON in production, pretty with --debug)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than interpolated messages
//! - Secrets (tokens, client secret) never appear in fields
//! - Metrics are cheap; recording without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
