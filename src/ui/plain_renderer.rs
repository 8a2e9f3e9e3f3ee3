use std::io::{IsTerminal, Write};

use anstream::{AutoStream, ColorChoice};
use anstyle::Style;

use crate::ui::progress::ListSpinner;
use crate::ui::renderer::{Renderer, SpinnerHandle, UiResult};
use crate::ui::table::render_table;
use crate::ui::theme::{is_ci_environment, no_color_requested, OutputMode, Theme};
use crate::ui::widgets::{
    KeyValue, MessageBlock, NoticeLevel, ResultMark, SummaryCounts, TableSpec,
};

pub struct PlainRenderer<W: Write> {
    writer: W,
    color_enabled: bool,
    progress_enabled: bool,
    theme: Theme,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(writer: W, color_enabled: bool) -> Self {
        Self {
            writer,
            color_enabled,
            progress_enabled: false,
            theme: Theme::default(),
        }
    }

    pub fn with_progress_enabled(mut self, enabled: bool) -> Self {
        self.progress_enabled = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn flush(&mut self) -> UiResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn style_text(&self, style: Style, text: &str) -> String {
        if !self.color_enabled {
            return text.to_owned();
        }
        format!("{}{}{}", style.render(), text, style.render_reset())
    }

    fn write_block(&mut self, label: &str, style: Style, block: &MessageBlock) -> UiResult<()> {
        let marker = self.style_text(style, label);
        writeln!(self.writer, "{marker} {}", block.title)?;
        writeln!(self.writer, "  {}", block.body)?;
        if let Some(detail) = &block.detail {
            for line in detail.lines() {
                let line = self.style_text(self.theme.detail, line);
                writeln!(self.writer, "  │ {line}")?;
            }
        }
        if let Some(hint) = &block.hint {
            let hint_label = self.style_text(self.theme.key, "hint");
            writeln!(self.writer, "  {hint_label}: {hint}")?;
        }
        Ok(())
    }
}

fn color_choice(mode: OutputMode) -> ColorChoice {
    match mode {
        OutputMode::Auto => ColorChoice::Auto,
        OutputMode::Always => ColorChoice::AlwaysAnsi,
        OutputMode::Never => ColorChoice::Never,
    }
}

impl PlainRenderer<AutoStream<std::io::Stdout>> {
    pub fn stdout(mode: OutputMode) -> Self {
        let stream = AutoStream::new(std::io::stdout(), color_choice(mode));
        let is_tty = std::io::stdout().is_terminal();
        Self::new(stream, mode.color_enabled(is_tty, no_color_requested()))
    }
}

impl PlainRenderer<AutoStream<std::io::Stderr>> {
    pub fn stderr(mode: OutputMode) -> Self {
        let stream = AutoStream::new(std::io::stderr(), color_choice(mode));
        let is_tty = std::io::stderr().is_terminal();
        Self::new(stream, mode.color_enabled(is_tty, no_color_requested()))
            .with_progress_enabled(is_tty && !is_ci_environment())
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn text(&mut self, body: &str) -> UiResult<()> {
        write!(self.writer, "{body}")?;
        if !body.ends_with('\n') {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn section(&mut self, title: &str) -> UiResult<()> {
        let rendered = self.style_text(self.theme.heading, title);
        let underline = self.style_text(self.theme.rule, &"─".repeat(title.chars().count()));
        writeln!(self.writer, "{rendered}")?;
        writeln!(self.writer, "{underline}")?;
        Ok(())
    }

    fn notice(&mut self, level: NoticeLevel, body: &str) -> UiResult<()> {
        let (label, style) = self.theme.notice(level);
        let marker = self.style_text(style, "•");
        let label = self.style_text(self.theme.rule, label);
        writeln!(self.writer, "{marker} {label}: {body}")?;
        Ok(())
    }

    fn error_block(&mut self, block: &MessageBlock) -> UiResult<()> {
        self.write_block("[error]", self.theme.failed, block)
    }

    fn key_values(&mut self, items: &[KeyValue]) -> UiResult<()> {
        for item in items {
            let key = self.style_text(self.theme.key, &item.key);
            writeln!(self.writer, "{key}: {}", item.value)?;
        }
        Ok(())
    }

    fn result(&mut self, label: &str, mark: ResultMark) -> UiResult<()> {
        let (symbol, style) = self.theme.mark(mark);
        let symbol = self.style_text(style, symbol);
        writeln!(self.writer, "{symbol} {label}")?;
        Ok(())
    }

    fn summary(&mut self, counts: SummaryCounts) -> UiResult<()> {
        let passed = self.style_text(self.theme.passed, &counts.passed.to_string());
        let failed = self.style_text(self.theme.failed, &counts.failed.to_string());
        let idle = self.style_text(self.theme.rule, &counts.idle.to_string());
        writeln!(
            self.writer,
            "summary  passed:{passed}  failed:{failed}  idle:{idle}"
        )?;
        Ok(())
    }

    fn table(&mut self, spec: &TableSpec) -> UiResult<()> {
        let rendered = render_table(spec);
        if rendered.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{rendered}")?;
        Ok(())
    }

    fn spinner(&mut self, label: &str) -> UiResult<Box<dyn SpinnerHandle>> {
        if self.progress_enabled {
            return Ok(Box::new(ListSpinner::live(label)));
        }
        Ok(Box::new(ListSpinner::Silent))
    }
}
