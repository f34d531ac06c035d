//! Circle discovery and invite recommendations over ego networks.
//!
//! ```no_run
//! # async fn run() -> Result<(), circles_sdk::SdkError> {
//! use circles_core::config::AppConfig;
//! use circles_sdk::CircleService;
//!
//! let service = CircleService::from_config(AppConfig::default())?;
//! let prepared = service.prepare(0, "leiden").await?;
//! let summary = prepared.summary();
//! let invites = service.suggest_invites(&prepared, summary.circle_sizes[0].0, Some(5))?;
//! # let _ = invites;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod service;
pub mod session;

pub use error::SdkError;
pub use registry::DetectorRegistry;
pub use service::CircleService;
pub use session::{EgoSummary, PreparedEgo};
