//! Loading screen, shown until the identity session is ready.

use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::{Throbber, ThrobberState};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct LoadingScreen {
    throbber_state: ThrobberState,
    collection_path: Option<String>,
}

impl LoadingScreen {
    pub fn new() -> Self {
        Self {
            throbber_state: ThrobberState::default(),
            collection_path: None,
        }
    }
}

impl Component for LoadingScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => self.throbber_state.calc_next(),
            Action::ViewUpdated(view) => {
                self.collection_path = view.collection_path.as_ref().map(ToString::to_string);
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

        let label_width = 26u16.min(layout[1].width);
        let [throbber_area] = Layout::horizontal([Constraint::Length(label_width)])
            .flex(Flex::Center)
            .areas(layout[1]);

        let throbber = Throbber::default()
            .label(" Loading Application...")
            .style(Style::default().fg(theme::NEON_CYAN))
            .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));

        frame.render_stateful_widget(throbber, throbber_area, &mut self.throbber_state.clone());

        if let Some(ref path) = self.collection_path {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("Signing in for {path}"), theme::caption()))
                    .centered(),
                layout[2],
            );
        }
    }

    fn id(&self) -> &'static str {
        "Loading"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use moneyboard_core::{CollectionPath, DashboardView};

    use crate::screens::test_support::render;

    #[test]
    fn shows_loading_label() {
        let screen = LoadingScreen::new();
        let text = render(&screen, 60, 10);
        assert!(text.contains("Loading Application..."), "{text}");
    }

    #[test]
    fn shows_collection_path_once_known() {
        let mut screen = LoadingScreen::new();
        let view = DashboardView {
            collection_path: Some(CollectionPath::expenses("household").unwrap()),
            ..DashboardView::default()
        };
        screen.update(&Action::ViewUpdated(Arc::new(view))).unwrap();
        screen.update(&Action::Tick).unwrap();

        let text = render(&screen, 80, 10);
        assert!(
            text.contains("/artifacts/household/public/data/expenses"),
            "{text}"
        );
    }
}
