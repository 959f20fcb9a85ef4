//! patchstack-core: patch-series management and rebuild orchestration
//!
//! This crate holds the decision logic behind the `patchstack` binary:
//! - `series`: the ordered quilt patch series and its on-disk format
//! - `apply`: idempotent reset-then-apply of the series against a checkout
//! - `staleness`: mtime-based verdict on whether a rebuild is needed
//! - `orchestrate` / `pipeline`: dispatch to the full-setup or incremental
//!   build pathway, driving the external toolchain (git, gclient, gn, ninja)
//! - `release`: packaging of the built browser into a distributable tarball

pub mod apply;
pub mod config;
pub mod error;
pub mod orchestrate;
pub mod pipeline;
pub mod process;
pub mod release;
pub mod series;
pub mod staleness;

pub use apply::{ApplyReport, QuiltOutcome, reset_and_apply};
pub use config::BuildConfig;
pub use error::{CoreError, Result};
pub use orchestrate::{orchestrate, verdict};
pub use series::{AddOutcome, PatchSeries};
pub use staleness::Staleness;
