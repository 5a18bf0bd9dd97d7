//! Screen identifier and selection from the dashboard view.

use std::fmt;

use moneyboard_core::{DashboardView, FailureKind, Phase};

/// The three full-frame screens. Which one is shown follows the view,
/// not user navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Loading,
    Error,
    Dashboard,
}

impl ScreenId {
    /// Configuration and initialization failures replace the whole UI.
    /// A subscription failure keeps the dashboard and its last snapshot.
    pub fn for_view(view: &DashboardView) -> Self {
        match view.phase {
            Phase::Failed(FailureKind::Subscription) => Self::Dashboard,
            Phase::Failed(_) => Self::Error,
            _ if view.error.is_some() => Self::Error,
            _ if view.loading => Self::Loading,
            _ => Self::Dashboard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Error => "Error",
            Self::Dashboard => "Dashboard",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneyboard_core::{Session, SubjectId};

    #[test]
    fn fresh_view_is_loading() {
        assert_eq!(ScreenId::for_view(&DashboardView::default()), ScreenId::Loading);
    }

    #[test]
    fn ready_view_shows_dashboard() {
        let view = DashboardView {
            phase: Phase::Subscribed,
            session: Session::ready(SubjectId::anonymous()),
            loading: false,
            ..DashboardView::default()
        };
        assert_eq!(ScreenId::for_view(&view), ScreenId::Dashboard);
    }

    #[test]
    fn fatal_failures_show_error_screen() {
        for kind in [FailureKind::Configuration, FailureKind::Initialization] {
            let view = DashboardView {
                phase: Phase::Failed(kind),
                loading: false,
                error: Some("boom".into()),
                ..DashboardView::default()
            };
            assert_eq!(ScreenId::for_view(&view), ScreenId::Error);
        }
    }

    #[test]
    fn subscription_failure_keeps_dashboard() {
        let view = DashboardView {
            phase: Phase::Failed(FailureKind::Subscription),
            session: Session::ready(SubjectId::new("uid-1")),
            loading: false,
            error: Some("Failed to fetch real-time data: denied".into()),
            ..DashboardView::default()
        };
        assert_eq!(ScreenId::for_view(&view), ScreenId::Dashboard);
    }
}
