//! Run state: per-resource provisioning status that makes apply resumable.
//!
//! # Storage Layout
//!
//! ```text
//! {data_dir}/
//! ├── state.json          # live RunRecord
//! └── state.last.json     # archive of the last fully successful run
//! ```
//!
//! # Example State File
//!
//! ```json
//! {
//!   "version": 1,
//!   "stacks": {
//!     "network": {
//!       "resources": {
//!         "vpc": {
//!           "status": "provisioned",
//!           "outputs": { "vpc_id": "vpc-1a2b3c4d" },
//!           "fingerprint": "a1b2c3d4e5f6789012ab",
//!           "last_attempt": 1760745600,
//!           "last_error": null
//!         }
//!       },
//!       "outputs": { "net_id": "vpc-1a2b3c4d" }
//!     }
//!   }
//! }
//! ```

mod tracker;
mod types;

pub use tracker::RunStateTracker;
pub use types::{ResourceRecord, ResourceStatus, RunRecord, StackRecord, StateError};
pub(crate) use types::now_unix;
