// ── Unified domain model ──
//
// Every type in this module is the canonical representation the portal
// consumers depend on. Raw snapshot/list records from `sitewatch_api` are
// merged into these shapes by `convert`.

pub mod alert;
pub mod comment;
pub mod snapshot;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use sitewatch_core::model::*` gives you everything.

pub use alert::{Alert, AlertType, LatLng};
pub use comment::Comment;
pub use snapshot::{AlertSnapshot, FacetOptions};
