//! Data bridge: connects the [`Dashboard`] view channel to TUI actions.
//!
//! Runs as a background task: starts the dashboard, then forwards every
//! published [`DashboardView`](moneyboard_core::DashboardView) as an
//! [`Action::ViewUpdated`] through the TUI's action channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use moneyboard_core::Dashboard;

use crate::action::Action;

/// Start `dashboard` and forward its view until cancelled.
///
/// Start failures are already published in the view, so the loop keeps
/// forwarding after one: the error screen renders from the view like
/// every other state.
pub async fn spawn_data_bridge(
    dashboard: Dashboard,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut view = dashboard.view();

    if let Err(e) = dashboard.start().await {
        warn!(error = %e, "dashboard failed to start");
    }

    // Push the current view so the first frame reflects start()
    let initial = Arc::new(view.borrow_and_update().clone());
    let _ = action_tx.send(Action::ViewUpdated(initial));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = view.changed() => {
                if changed.is_err() {
                    debug!("view channel closed");
                    break;
                }
                let current = Arc::new(view.borrow_and_update().clone());
                debug!(phase = %current.phase, records = current.snapshot.len(), "dispatching ViewUpdated");
                if action_tx.send(Action::ViewUpdated(current)).is_err() {
                    break;
                }
            }
        }
    }

    dashboard.shutdown().await;
    debug!("data bridge shut down");
}
