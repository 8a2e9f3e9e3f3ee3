use anstyle::{AnsiColor, Color, Style};

use crate::ui::widgets::{NoticeLevel, ResultMark};

pub const COLOR_ENV: &str = "PLAYDECK_COLOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Auto,
    Always,
    Never,
}

impl OutputMode {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(COLOR_ENV).ok().as_deref())
    }

    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("always") => OutputMode::Always,
            Some("never") => OutputMode::Never,
            _ => OutputMode::Auto,
        }
    }

    pub fn color_enabled(self, is_tty: bool, no_color: bool) -> bool {
        if no_color {
            return false;
        }
        match self {
            OutputMode::Always => true,
            OutputMode::Never => false,
            OutputMode::Auto => is_tty,
        }
    }
}

fn fg(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub heading: Style,
    pub rule: Style,
    pub key: Style,
    pub detail: Style,
    pub passed: Style,
    pub failed: Style,
    pub pending: Style,
    pub skipped: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            heading: fg(AnsiColor::Magenta).bold(),
            rule: fg(AnsiColor::BrightBlack),
            key: fg(AnsiColor::Cyan),
            detail: fg(AnsiColor::BrightBlack).italic(),
            passed: fg(AnsiColor::Green).bold(),
            failed: fg(AnsiColor::Red).bold(),
            pending: fg(AnsiColor::Blue),
            skipped: fg(AnsiColor::Yellow),
        }
    }
}

impl Theme {
    pub fn mark(&self, mark: ResultMark) -> (&'static str, Style) {
        match mark {
            ResultMark::Idle => ("·", self.rule),
            ResultMark::Pending => ("◌", self.pending),
            ResultMark::Passed => ("✓", self.passed),
            ResultMark::Failed => ("✘", self.failed),
            ResultMark::Skipped => ("-", self.skipped),
        }
    }

    pub fn notice(&self, level: NoticeLevel) -> (&'static str, Style) {
        match level {
            NoticeLevel::Info => ("info", self.key),
            NoticeLevel::Warning => ("warn", self.skipped),
        }
    }
}

pub fn no_color_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

pub fn is_ci_environment() -> bool {
    std::env::var_os("CI").is_some()
}
