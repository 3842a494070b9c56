use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::{Result, WrapErr};
use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Built-in presets, in the order `T` cycles through them.
pub const PRESETS: [&str; 4] = ["default", "dracula", "gruvbox", "nord"];

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub highlight: Style,
    pub event: Style,
    pub all_day: Style,
    pub success: Style,
    pub error: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Yellow),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            highlight: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            event: Style::default().fg(Color::Green),
            all_day: Style::default().fg(Color::Black).bg(Color::Green),
            success: Style::default().fg(Color::Black).bg(Color::Green),
            error: Style::default().fg(Color::White).bg(Color::Red),
        }
    }
}

impl Theme {
    /// Get a built-in preset by name.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => Self::dracula(),
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            _ => Self::default(),
        }
    }

    fn dracula() -> Self {
        let purple = Color::Rgb(189, 147, 249);
        let surface = Color::Rgb(68, 71, 90);
        Self {
            name: "dracula".to_string(),
            today: Style::default().fg(Color::Black).bg(purple),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(139, 233, 253)),
            header: Style::default().fg(Color::Rgb(248, 248, 242)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(98, 114, 164)),
            border: Style::default().fg(surface),
            status: Style::default().fg(Color::Rgb(248, 248, 242)).bg(surface),
            highlight: Style::default().bg(surface).add_modifier(Modifier::BOLD),
            event: Style::default().fg(Color::Rgb(80, 250, 123)),
            all_day: Style::default().fg(Color::Black).bg(Color::Rgb(255, 121, 198)),
            success: Style::default().fg(Color::Black).bg(Color::Rgb(80, 250, 123)),
            error: Style::default().fg(Color::Black).bg(Color::Rgb(255, 85, 85)),
        }
    }

    fn gruvbox() -> Self {
        let surface = Color::Rgb(80, 73, 69);
        Self {
            name: "gruvbox".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(250, 189, 47)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(131, 165, 152)),
            header: Style::default().fg(Color::Rgb(235, 219, 178)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(146, 131, 116)),
            border: Style::default().fg(Color::Rgb(102, 92, 84)),
            status: Style::default().fg(Color::Rgb(235, 219, 178)).bg(surface),
            highlight: Style::default().bg(surface).add_modifier(Modifier::BOLD),
            event: Style::default().fg(Color::Rgb(184, 187, 38)),
            all_day: Style::default().fg(Color::Black).bg(Color::Rgb(254, 128, 25)),
            success: Style::default().fg(Color::Black).bg(Color::Rgb(184, 187, 38)),
            error: Style::default().fg(Color::Black).bg(Color::Rgb(251, 73, 52)),
        }
    }

    fn nord() -> Self {
        let surface = Color::Rgb(67, 76, 94);
        Self {
            name: "nord".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(235, 203, 139)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(136, 192, 208)),
            header: Style::default().fg(Color::Rgb(229, 233, 240)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(76, 86, 106)),
            border: Style::default().fg(surface),
            status: Style::default().fg(Color::Rgb(229, 233, 240)).bg(surface),
            highlight: Style::default().bg(surface).add_modifier(Modifier::BOLD),
            event: Style::default().fg(Color::Rgb(163, 190, 140)),
            all_day: Style::default().fg(Color::Black).bg(Color::Rgb(129, 161, 193)),
            success: Style::default().fg(Color::Black).bg(Color::Rgb(163, 190, 140)),
            error: Style::default().fg(Color::Black).bg(Color::Rgb(191, 97, 106)),
        }
    }
}

// ── Persisted preferences ──

/// User theme preferences as stored on disk: a preset plus per-color
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bg: Option<String>,
}

impl ThemeConfig {
    pub fn to_theme(&self) -> Theme {
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        let overrides: [(&Option<String>, fn(&mut Theme, Color)); 9] = [
            (&self.today_fg, |t, c| t.today = t.today.fg(c)),
            (&self.today_bg, |t, c| t.today = t.today.bg(c)),
            (&self.selected_fg, |t, c| t.selected = t.selected.fg(c)),
            (&self.selected_bg, |t, c| t.selected = t.selected.bg(c)),
            (&self.header_fg, |t, c| t.header = t.header.fg(c)),
            (&self.event_fg, |t, c| t.event = t.event.fg(c)),
            (&self.all_day_bg, |t, c| t.all_day = t.all_day.bg(c)),
            (&self.status_fg, |t, c| t.status = t.status.fg(c)),
            (&self.status_bg, |t, c| t.status = t.status.bg(c)),
        ];
        for (value, apply) in overrides {
            if let Some(c) = value.as_deref().and_then(parse_color) {
                apply(&mut theme, c);
            }
        }

        theme
    }

    /// Switch to the preset after the current one. Color overrides stay.
    pub fn cycle_preset(&mut self) {
        let current = self.preset.as_deref().unwrap_or(PRESETS[0]);
        let idx = PRESETS.iter().position(|p| *p == current).unwrap_or(0);
        self.preset = Some(PRESETS[(idx + 1) % PRESETS.len()].to_string());
    }
}

/// Where theme preferences are read from on start and written to on change.
pub trait ThemeStore {
    fn load(&self) -> Option<ThemeConfig>;
    fn save(&self, config: &ThemeConfig) -> Result<()>;
}

/// `theme.toml` on disk.
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Option<ThemeConfig> {
        let content = fs::read_to_string(&self.path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable theme file");
                None
            }
        }
    }

    fn save(&self, config: &ThemeConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(config).wrap_err("serializing theme")?;
        fs::write(&self.path, content)
            .wrap_err_with(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if s.starts_with('#') && s.len() == 7 {
        let r = u8::from_str_radix(&s[1..3], 16).ok()?;
        let g = u8::from_str_radix(&s[3..5], 16).ok()?;
        let b = u8::from_str_radix(&s[5..7], 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        _ => None,
    }
}
