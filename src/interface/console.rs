//! Terminal presentation shell
//!
//! Everything rendered here is derived from the controller's published
//! `SessionStatus`; the shell owns no session state of its own.

use crate::application::SessionController;
use crate::domain::session::{SessionState, SessionStatus};
use crate::interface::visualizer::{render_bar, LevelSampler, BAR_WIDTH};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const METER_INTERVAL: Duration = Duration::from_secs(1);

/// The single start/stop control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleControl {
    Start,
    Cancel,
    Stop,
}

impl ToggleControl {
    pub fn for_state(state: SessionState) -> Self {
        match state {
            SessionState::Idle => ToggleControl::Start,
            SessionState::Connecting => ToggleControl::Cancel,
            SessionState::Active => ToggleControl::Stop,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToggleControl::Start => "Start",
            ToggleControl::Cancel => "Cancel",
            ToggleControl::Stop => "Stop",
        }
    }
}

/// A line typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Start,
    Stop,
    Events,
    Quit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Command::Toggle,
            "start" => Command::Start,
            "stop" | "cancel" => Command::Stop,
            "events" | "log" => Command::Events,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

pub fn render_status(status: &SessionStatus) -> String {
    let control = ToggleControl::for_state(status.state);
    let mut line = format!("[{}] state: {:?}", control.label(), status.state);
    if let Some(id) = &status.session_id {
        line.push_str(&format!(" session: {}", id));
    }
    if let Some(started_at) = &status.started_at {
        line.push_str(&format!(" since {}", started_at.format("%H:%M:%S")));
    }
    if let Some(failure) = &status.failure {
        line.push_str(&format!(" ({} failure: {})", failure.kind(), failure));
    }
    line
}

pub struct ConsoleShell {
    controller: Arc<SessionController>,
}

impl ConsoleShell {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }

    /// Run until `quit` or end of input; the session is stopped on exit.
    pub async fn run<R>(&self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let renderer = self.spawn_renderer(self.controller.subscribe());
        let mut lines = input.lines();

        println!("{}", render_status(&self.controller.status()));
        println!("Commands: <enter> toggle, start, stop, events, quit");

        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Command::Toggle => self.toggle(),
                Command::Start => self.start(),
                Command::Stop => self.controller.stop().await,
                Command::Events => self.print_events().await,
                Command::Quit => break,
                Command::Unknown => println!("Unknown command: {}", line.trim()),
            }
        }

        self.controller.stop().await;
        renderer.abort();
        Ok(())
    }

    fn toggle(&self) {
        match ToggleControl::for_state(self.controller.status().state) {
            ToggleControl::Start => self.start(),
            ToggleControl::Cancel | ToggleControl::Stop => {
                let controller = self.controller.clone();
                tokio::spawn(async move { controller.stop().await });
            }
        }
    }

    /// Start runs in the background so `Cancel` stays responsive.
    fn start(&self) {
        let controller = self.controller.clone();
        tokio::spawn(async move {
            match controller.start().await {
                Ok(id) => debug!("Session {} provisioned", id),
                Err(e) => println!("Start failed: {}", e),
            }
        });
    }

    async fn print_events(&self) {
        let events = self.controller.events().await;
        if events.is_empty() {
            println!("(no events)");
            return;
        }
        for event in events {
            match serde_json::to_string(&event) {
                Ok(text) => println!("{}", text),
                Err(e) => warn!("Unprintable event: {}", e),
            }
        }
    }

    fn spawn_renderer(&self, mut status_rx: watch::Receiver<SessionStatus>) -> JoinHandle<()> {
        let controller = self.controller.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(METER_INTERVAL);
            let mut sampler = LevelSampler::new();
            let mut last_tick = Instant::now();

            loop {
                tokio::select! {
                    changed = status_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = status_rx.borrow_and_update().clone();
                        println!("{}", render_status(&status));
                        sampler = LevelSampler::new();
                    }
                    _ = ticker.tick() => {
                        let elapsed = last_tick.elapsed();
                        last_tick = Instant::now();
                        if controller.status().state != SessionState::Active {
                            continue;
                        }
                        let remote = controller.remote_stream().await;
                        let rate = sampler.sample_stream(&remote, elapsed).await;
                        println!("remote {}", render_bar(rate, BAR_WIDTH));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::error::SessionError;
    use crate::domain::shared::value_objects::SessionId;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_toggle_follows_state() {
        assert_eq!(ToggleControl::for_state(SessionState::Idle).label(), "Start");
        assert_eq!(ToggleControl::for_state(SessionState::Connecting).label(), "Cancel");
        assert_eq!(ToggleControl::for_state(SessionState::Active).label(), "Stop");
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse(""), Command::Toggle);
        assert_eq!(Command::parse("  START "), Command::Start);
        assert_eq!(Command::parse("cancel"), Command::Stop);
        assert_eq!(Command::parse("events"), Command::Events);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("dance"), Command::Unknown);
    }

    #[test]
    fn test_render_status_surfaces_failure() {
        let status = SessionStatus {
            state: SessionState::Idle,
            session_id: None,
            started_at: None,
            failure: Some(SessionError::Auth("401".to_string())),
        };
        let line = render_status(&status);
        assert!(line.starts_with("[Start]"));
        assert!(line.contains("401"));

        let id = SessionId::new();
        let started_at = Utc.with_ymd_and_hms(2024, 12, 17, 9, 30, 5).unwrap();
        let status = SessionStatus {
            state: SessionState::Active,
            session_id: Some(id),
            started_at: Some(started_at),
            failure: None,
        };
        let line = render_status(&status);
        assert!(line.starts_with("[Stop]"));
        assert!(line.contains(&id.to_string()));
        assert!(line.ends_with("since 09:30:05"));
    }
}
