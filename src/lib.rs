pub mod error;
pub mod exec;
pub mod handlers;
pub mod logging;
pub mod payload;
pub mod rules;

use std::sync::Arc;

use rules::RuleTable;

/// Shared application state. The rule table is built once at startup and
/// never mutated afterwards, so handlers share it behind a plain `Arc`
/// with no locking.
pub struct AppState {
    pub rules: RuleTable,
}

pub type SharedState = Arc<AppState>;
