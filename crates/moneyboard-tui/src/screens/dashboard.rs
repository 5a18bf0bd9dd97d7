//! Dashboard screen: summary cards over the live expense history.
//!
//! Layout:
//! ┌─ Global Money Manager ─────────────────────────── User: {uid} ─┐
//! │ ┌─ subscription error banner (only after a listener fault) ──┐ │
//! │ └─────────────────────────────────────────────────────────────┘ │
//! │ ┌─ Total Shared Expenses ──┐ ┌─ Your Current Liability ──────┐ │
//! │ └──────────────────────────┘ └───────────────────────────────┘ │
//! │ ┌─ Expense History (n) ───────────────────────────────────────┐ │
//! │ │ id                     Added on: date               $100.00 │ │
//! │ └─────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘

use std::cell::Cell;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

use moneyboard_core::model::summary::SHARED_PER_RECORD_CENTS;
use moneyboard_core::{ExpenseSummary, FailureKind, Phase, Snapshot};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::money_fmt::{fmt_added_on, fmt_dollars, truncate_text};

/// Dashboard screen state.
pub struct DashboardScreen {
    subject: String,
    snapshot: Snapshot,
    summary: ExpenseSummary,
    collection_path: String,
    /// Subscription failure shown above the last good snapshot.
    banner: Option<String>,
    scroll: usize,
    /// History rows that fit in the last render.
    visible_rows: Cell<usize>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            subject: "-".into(),
            snapshot: Snapshot::default(),
            summary: ExpenseSummary::default(),
            collection_path: String::new(),
            banner: None,
            scroll: 0,
            visible_rows: Cell::new(0),
        }
    }

    fn max_scroll(&self) -> usize {
        self.snapshot
            .len()
            .saturating_sub(self.visible_rows.get().max(1))
    }

    fn render_banner(frame: &mut Frame, area: Rect, message: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::ERROR_RED));
        let line = Line::from(vec![
            Span::styled(" ✗ ", Style::default().fg(theme::ERROR_RED)),
            Span::styled(message, Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_card(
        frame: &mut Frame,
        area: Rect,
        title: &str,
        figure: &str,
        caption: &str,
        accent: Color,
    ) {
        let block = Block::default()
            .title(Span::styled(format!(" {title} "), theme::figure(accent)))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent));

        let lines = vec![
            Line::from(Span::styled(format!(" {figure}"), theme::figure(theme::DIM_WHITE))),
            Line::from(""),
            Line::from(Span::styled(format!(" {caption}"), theme::caption())),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let total = self.snapshot.len();
        let block = Block::default()
            .title(Span::styled(
                format!(" Expense History ({total}) "),
                theme::figure(theme::LIGHT_BLUE),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let max_rows = usize::from(inner.height);
        self.visible_rows.set(max_rows);

        if total == 0 {
            let line = Line::from(vec![
                Span::styled(" No expenses recorded yet. Data path: ", theme::caption()),
                Span::styled(
                    self.collection_path.as_str(),
                    Style::default().fg(theme::NEON_CYAN),
                ),
            ]);
            frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: false }), inner);
            return;
        }

        let price = fmt_dollars(SHARED_PER_RECORD_CENTS);
        let date_w = 22usize;
        let price_w = 9usize;
        let id_w = usize::from(inner.width)
            .saturating_sub(date_w + price_w + 2)
            .max(8);

        let lines: Vec<Line> = self
            .snapshot
            .iter()
            .skip(self.scroll)
            .take(max_rows)
            .map(|record| {
                let id = truncate_text(&record.id, id_w);
                let added = format!("Added on: {}", fmt_added_on(record.timestamp));
                Line::from(vec![
                    Span::styled(format!(" {id:<id_w$}"), Style::default().fg(theme::NEON_CYAN)),
                    Span::styled(format!(" {added:<date_w$}"), theme::caption()),
                    Span::styled(
                        format!("{price:>price_w$}"),
                        theme::figure(theme::SUCCESS_GREEN),
                    ),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);

        if total > max_rows {
            let mut state =
                ScrollbarState::new(total.saturating_sub(max_rows)).position(self.scroll);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(None)
                    .end_symbol(None)
                    .track_symbol(Some("│"))
                    .thumb_symbol("█"),
                inner,
                &mut state,
            );
        }
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let max_scroll = self.max_scroll();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = (self.scroll + 1).min(max_scroll);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::PageDown => {
                self.scroll = (self.scroll + 10).min(max_scroll);
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
            }
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll = max_scroll,
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::ViewUpdated(view) = action {
            let subject = view.session.subject_id();
            self.subject = if subject.is_empty() {
                "-".into()
            } else {
                subject.to_string()
            };
            self.snapshot = view.snapshot.clone();
            self.summary = view.summary();
            self.collection_path = view
                .collection_path
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            self.banner = match view.phase {
                Phase::Failed(FailureKind::Subscription) => view.error.clone(),
                _ => None,
            };
            self.scroll = self.scroll.min(self.max_scroll());
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(Span::styled(" Global Money Manager ", theme::title_style()));
        let user = Line::from(vec![
            Span::styled(" User: ", theme::caption()),
            Span::styled(
                format!("{} ", self.subject),
                Style::default().fg(theme::ELECTRIC_PURPLE),
            ),
        ])
        .right_aligned();

        let block = Block::default()
            .title(title)
            .title(user)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width < 40 || inner.height < 10 {
            let summary = format!(
                "Records: {} │ Shared: {} │ Liability: {}",
                self.summary.record_count,
                fmt_dollars(self.summary.total_shared_cents),
                fmt_dollars(self.summary.liability_cents),
            );
            frame.render_widget(Paragraph::new(summary).style(theme::table_row()), inner);
            return;
        }

        let banner_height = if self.banner.is_some() { 3 } else { 0 };
        let rows = Layout::vertical([
            Constraint::Length(banner_height),
            Constraint::Length(5), // Summary cards
            Constraint::Min(3),    // History
        ])
        .split(inner);

        if let Some(ref banner) = self.banner {
            Self::render_banner(frame, rows[0], banner);
        }

        let cards = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        Self::render_card(
            frame,
            cards[0],
            "Total Shared Expenses",
            &fmt_dollars(self.summary.total_shared_cents),
            &format!("Based on {} records.", self.summary.record_count),
            theme::ELECTRIC_PURPLE,
        );
        Self::render_card(
            frame,
            cards[1],
            "Your Current Liability",
            &fmt_dollars(self.summary.liability_cents),
            "50% of shared total.",
            theme::CORAL,
        );

        self.render_history(frame, rows[2]);
    }

    fn id(&self) -> &'static str {
        "Dashboard"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use moneyboard_core::{CollectionPath, DashboardView, Record, Session, SubjectId};
    use serde_json::Map;

    use crate::screens::test_support::render;

    fn record(id: &str) -> Record {
        Record {
            id: id.into(),
            fields: Map::new(),
            timestamp: None,
        }
    }

    fn view(subject: &str, ids: &[&str]) -> DashboardView {
        DashboardView {
            phase: Phase::Subscribed,
            session: Session::ready(SubjectId::new(subject)),
            snapshot: Snapshot::from_records(ids.iter().map(|id| record(id))),
            loading: false,
            collection_path: Some(CollectionPath::expenses("default-app-id").unwrap()),
            ..DashboardView::default()
        }
    }

    fn screen_with(view: DashboardView) -> DashboardScreen {
        let mut screen = DashboardScreen::new();
        screen.update(&Action::ViewUpdated(Arc::new(view))).unwrap();
        screen
    }

    #[test]
    fn empty_collection_shows_data_path() {
        let screen = screen_with(view("anonymous", &[]));
        let text = render(&screen, 120, 24);

        assert!(text.contains("Global Money Manager"), "{text}");
        assert!(text.contains("User: anonymous"), "{text}");
        assert!(text.contains("Total Shared Expenses"), "{text}");
        assert!(text.contains("$0.00"), "{text}");
        assert!(text.contains("Expense History (0)"), "{text}");
        assert!(
            text.contains(
                "No expenses recorded yet. Data path: /artifacts/default-app-id/public/data/expenses"
            ),
            "{text}"
        );
    }

    #[test]
    fn three_records_scale_the_cards() {
        let screen = screen_with(view("uid-1", &["exp-c", "exp-a", "exp-b"]));
        let text = render(&screen, 120, 24);

        assert!(text.contains("User: uid-1"), "{text}");
        assert!(text.contains("$300.00"), "{text}");
        assert!(text.contains("$150.00"), "{text}");
        assert!(text.contains("Based on 3 records."), "{text}");
        assert!(text.contains("Expense History (3)"), "{text}");
        assert!(text.contains("$100.00"), "{text}");
        assert!(text.contains("Added on: unknown date"), "{text}");

        let c = text.find("exp-c").unwrap();
        let a = text.find("exp-a").unwrap();
        let b = text.find("exp-b").unwrap();
        assert!(c < a && a < b, "records keep delivery order");
    }

    #[test]
    fn subscription_error_is_a_banner_over_last_snapshot() {
        let mut failed = view("uid-1", &["exp-1", "exp-2"]);
        failed.phase = Phase::Failed(FailureKind::Subscription);
        failed.error = Some("Failed to fetch real-time data: Permission denied".into());

        let text = render(&screen_with(failed), 120, 24);
        assert!(text.contains("Failed to fetch real-time data"), "{text}");
        assert!(text.contains("exp-1"), "{text}");
        assert!(text.contains("exp-2"), "{text}");
        assert!(text.contains("$200.00"), "{text}");
    }

    #[test]
    fn scrolls_history_with_keys() {
        let ids: Vec<String> = (0..20).map(|i| format!("expense-{i:02}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut screen = screen_with(view("uid-1", &refs));

        let before = render(&screen, 80, 20);
        assert!(before.contains("expense-00"), "{before}");

        screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE))
            .unwrap();
        let after = render(&screen, 80, 20);
        assert!(!after.contains("expense-00"), "{after}");
        assert!(after.contains("expense-01"), "{after}");

        screen
            .handle_key_event(KeyEvent::new(KeyCode::End, KeyModifiers::NONE))
            .unwrap();
        assert!(render(&screen, 80, 20).contains("expense-19"));

        screen
            .handle_key_event(KeyEvent::new(KeyCode::Home, KeyModifiers::NONE))
            .unwrap();
        assert!(render(&screen, 80, 20).contains("expense-00"));
    }

    #[test]
    fn tiny_terminal_falls_back_to_summary_line() {
        let screen = screen_with(view("uid-1", &["exp-1"]));
        let text = render(&screen, 38, 8);
        assert!(text.contains("Records: 1"), "{text}");
    }
}
