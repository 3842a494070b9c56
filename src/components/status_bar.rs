use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A transient message shown in the status bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            kind,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// What the status bar reflects besides the toast.
pub struct StatusLine<'a> {
    pub mode: &'a str,
    pub loading: bool,
    pub syncing: bool,
    pub toast: Option<&'a Toast>,
}

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, status: &StatusLine, theme: &Theme) {
        let w = area.width as usize;

        let mut left = format!(" {} ", status.mode);
        if status.loading {
            left.push_str("[Loading] ");
        }
        if status.syncing {
            left.push_str("[Syncing...] ");
        }

        let (right_text, right_style) = match status.toast {
            Some(toast) => {
                let style = match toast.kind {
                    ToastKind::Success => theme.success,
                    ToastKind::Error => theme.error,
                    ToastKind::Info => theme.status,
                };
                (format!(" {} ", toast.message), style)
            }
            None => (hints(w).to_string(), theme.status),
        };

        let padding = " ".repeat(w.saturating_sub(left.chars().count() + right_text.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, theme.status),
            Span::styled(padding, theme.status),
            Span::styled(right_text, right_style),
        ]);

        frame.render_widget(Paragraph::new(line).style(theme.status), area);
    }
}

fn hints(width: usize) -> &'static str {
    if width >= 90 {
        " hjkl:Nav [/]:Mon t:Today Enter:Detail n:New e:Edit d:Del s:Sync ?:Help q:Quit "
    } else if width >= 60 {
        " Enter:Detail n:New s:Sync ?:Help q:Quit "
    } else {
        " ?:Help q:Quit "
    }
}
