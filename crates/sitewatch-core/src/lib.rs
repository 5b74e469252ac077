// sitewatch-core: Alert aggregation and refresh layer between the store
// gateway and the rendering shell.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
mod history;
pub mod model;
pub mod poll;
pub mod portal;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{SiteCache, SiteIndex};
pub use config::{FeatureToggles, ListIds, PortalConfig, SnapshotFolders, TlsVerification};
pub use error::{CoreError, SnapshotSource};
pub use filter::{FilterCriterion, FilterKey, FilterSet, FilterValue, apply_filters};
pub use poll::{PollController, PollState};
pub use portal::{ActiveView, Portal};
pub use store::AlertStore;
pub use stream::SnapshotStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{Alert, AlertSnapshot, AlertType, Comment, FacetOptions, LatLng};
