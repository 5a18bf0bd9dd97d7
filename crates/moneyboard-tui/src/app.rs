//! Application core: the event loop and action dispatch.

use std::collections::HashMap;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use moneyboard_core::{Dashboard, FailureKind, Phase};

use crate::action::Action;
use crate::component::Component;
use crate::event::{Event, EventReader, Pacing};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    /// Screen selected from the latest view.
    active_screen: ScreenId,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    /// Lifecycle phase from the latest view, for the status bar.
    phase: Phase,
    /// Non-fatal message from the latest view (e.g. a failed sign-in).
    notice: Option<String>,
    /// Action sender. The data bridge dispatches through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver, drained by the main loop.
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Taken by the data bridge when the loop starts.
    dashboard: Option<Dashboard>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        Self {
            active_screen: ScreenId::default(),
            screens: create_screens().into_iter().collect(),
            running: true,
            phase: Phase::Idle,
            notice: None,
            action_tx,
            action_rx,
            dashboard: Some(dashboard),
            data_cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;
        let (width, height) = tui.size().unwrap_or((80, 24));
        debug!(width, height, "terminal entered");

        let bridge = self.spawn_bridge();

        let mut events = EventReader::new(Pacing::default());

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        // Cancel the bridge and let it detach every listener
        self.data_cancel.cancel();
        events.stop();
        if let Some(bridge) = bridge {
            let _ = bridge.await;
        }
        info!("TUI event loop ended");
        Ok(())
    }

    fn spawn_bridge(&mut self) -> Option<JoinHandle<()>> {
        let dashboard = self.dashboard.take()?;
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        Some(tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(dashboard, tx, cancel).await;
        }))
    }

    /// Map a key event to an action. Quit keys are global; everything
    /// else goes to the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Apply one action to app state and propagate it to every screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(width, height) => {
                debug!(width, height, "terminal resized");
            }

            Action::ViewUpdated(view) => {
                self.phase = view.phase;
                self.notice.clone_from(&view.notice);

                let target = ScreenId::for_view(view);
                if target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    self.active_screen = target;
                }
            }

            Action::Tick | Action::Render => {}
        }

        // Every screen tracks the view so switching never shows stale data
        let mut follow_ups = Vec::new();
        for screen in self.screens.values_mut() {
            if let Some(next) = screen.update(action)? {
                debug!(screen = screen.id(), "follow-up action");
                follow_ups.push(next);
            }
        }
        for next in follow_ups {
            self.action_tx.send(next)?;
        }

        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }

        self.render_status_bar(frame, layout[1]);
    }

    /// Render the bottom status bar with lifecycle phase, notice, and key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let phase_indicator = match self.phase {
            Phase::Subscribed => Span::styled("● live", Style::default().fg(theme::SUCCESS_GREEN)),
            Phase::Ready => Span::styled("◐ ready", Style::default().fg(theme::ELECTRIC_YELLOW)),
            Phase::Idle | Phase::Authenticating => Span::styled(
                "◐ signing in",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
            Phase::Failed(FailureKind::Subscription) => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            Phase::Failed(_) => Span::styled("○ failed", Style::default().fg(theme::ERROR_RED)),
        };

        let mut spans = vec![Span::raw(" "), phase_indicator];

        if let Some(ref notice) = self.notice {
            spans.push(Span::styled(" │ ", theme::key_hint()));
            spans.push(Span::styled(
                notice.as_str(),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }

        spans.push(Span::styled(" │ ", theme::key_hint()));
        if self.active_screen == ScreenId::Dashboard {
            spans.push(Span::styled("j/k", theme::key_hint_key()));
            spans.push(Span::styled(" scroll  ", theme::key_hint()));
        }
        spans.push(Span::styled("q", theme::key_hint_key()));
        spans.push(Span::styled(" quit", theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
