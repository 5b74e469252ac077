// ── Comment domain type ──

use serde::{Deserialize, Serialize};

/// A comment attached to a specific alert occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    /// Composite correlation key: `"{node} {time triggered}"`.
    pub title: String,
    pub node: String,
    pub time_triggered: String,
    pub body: String,
    pub created: String,
}
