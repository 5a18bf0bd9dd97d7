//! Fatal error screen for configuration and initialization failures.

use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const HINT: &str = "Check the log file for details and ensure the Firebase configuration \
                    is set up (config.toml profile or MONEYBOARD_FIREBASE_CONFIG).";

pub struct ErrorScreen {
    message: String,
}

impl ErrorScreen {
    pub fn new() -> Self {
        Self {
            message: "Unknown error".into(),
        }
    }
}

impl Component for ErrorScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::ViewUpdated(view) = action {
            if let Some(ref error) = view.error {
                self.message.clone_from(error);
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let width = 72u16.min(area.width);
        let height = 11u16.min(area.height);
        let [row] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [panel] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(row);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::ERROR_RED))
            .style(Style::default().bg(theme::BG_ERROR));

        let lines = vec![
            Line::from(Span::styled(
                "Application Error",
                Style::default()
                    .fg(theme::ERROR_RED)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                self.message.as_str(),
                Style::default().fg(theme::DIM_WHITE),
            )),
            Line::from(""),
            Line::from(Span::styled(HINT, theme::caption())),
        ];

        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true }),
            panel,
        );
    }

    fn id(&self) -> &'static str {
        "Error"
    }
}
