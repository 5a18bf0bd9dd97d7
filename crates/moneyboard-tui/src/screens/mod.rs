//! Screen implementations. Each screen is a top-level Component.

pub mod dashboard;
pub mod error;
pub mod loading;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create one component per screen.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Loading, Box::new(loading::LoadingScreen::new())),
        (ScreenId::Error, Box::new(error::ErrorScreen::new())),
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new()),
        ),
    ]
}
