//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use moneyboard_core::DashboardView;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    /// A new view was published by the dashboard.
    ViewUpdated(Arc<DashboardView>),
}
