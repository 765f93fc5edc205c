//! statcards prepares the aggregated `UserStats` record consumed by the
//! animated stat-card renderer.
//!
//! Raw per-account activity records are loaded through a [`loader::StatsSource`]
//! (normally the local cache file) and folded into a single normalized record
//! by the [`pipeline`]. The [`github`] client regenerates the cache from live
//! data; it is never called on the render path.

pub mod github;
pub mod loader;
pub mod model;
pub mod pipeline;

pub use loader::{FileCacheSource, LoadError, StatsSource};
pub use model::{RenderInput, UserStats};
pub use pipeline::{aggregate_user_stats, prepare_user_stats};
