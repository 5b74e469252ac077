// Store REST surface
//
// Endpoint groups are implemented as inherent methods on `StoreClient`
// via separate files (`files.rs`, `lists.rs`) to keep `client.rs`
// focused on transport mechanics.

mod client;
mod files;
mod lists;
pub mod models;

pub use client::StoreClient;
pub use lists::odata_escape;
pub use models::{
    AlarmRecord, Collection, CommentRow, FileDescriptor, ListPage, NodeDownRecord, RowId,
    SiteRecord,
};
