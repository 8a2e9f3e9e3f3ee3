const ESC: char = '\u{1b}';

// Cursor up + erase line: the tool redrawing its progress line.
const REDRAW_SEQUENCE: &str = "\u{1b}[1A\u{1b}[2K";

const SCOPE_OPEN: &str = "<span>";
const SCOPE_CLOSE: &str = "</span>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleClass {
    Plain,
    Bold,
    Red,
    Green,
    Yellow,
    Magenta,
    Dim,
    RedOnRed,
    WhiteOnRed,
    YellowOnYellow,
    BlackOnYellow,
}

impl StyleClass {
    /// Exact match only; `31;1` is not the same switch as `1;31`.
    pub fn from_params(params: &str) -> Option<Self> {
        let style = match params {
            "0" => StyleClass::Plain,
            "1" => StyleClass::Bold,
            "31" => StyleClass::Red,
            "32" => StyleClass::Green,
            "33" => StyleClass::Yellow,
            // Warnings from older tool versions.
            "35" => StyleClass::Magenta,
            "37" => StyleClass::Dim,
            "41;31" => StyleClass::RedOnRed,
            "41;97" => StyleClass::WhiteOnRed,
            "43;33" => StyleClass::YellowOnYellow,
            "43;30" => StyleClass::BlackOnYellow,
            _ => return None,
        };
        Some(style)
    }

    pub fn class_attr(self) -> Option<&'static str> {
        match self {
            StyleClass::Plain => None,
            StyleClass::Bold => Some("color-bold"),
            StyleClass::Red => Some("color-red"),
            StyleClass::Green => Some("color-green"),
            StyleClass::Yellow => Some("color-yellow"),
            StyleClass::Magenta => Some("color-magenta"),
            StyleClass::Dim => Some("color-dim"),
            StyleClass::RedOnRed => Some("bg-red color-red"),
            StyleClass::WhiteOnRed => Some("bg-red color-white"),
            StyleClass::YellowOnYellow => Some("bg-yellow color-yellow"),
            StyleClass::BlackOnYellow => Some("bg-yellow color-black"),
        }
    }

    fn push_switch(self, out: &mut String) {
        out.push_str(SCOPE_CLOSE);
        match self.class_attr() {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
            }
            None => out.push_str(SCOPE_OPEN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlSequence<'a> {
    raw: &'a str,
    params: &'a str,
    final_byte: u8,
}

impl<'a> ControlSequence<'a> {
    fn parse(input: &'a str) -> Option<Self> {
        let body = input.strip_prefix("\u{1b}[")?;
        for (idx, byte) in body.bytes().enumerate() {
            match byte {
                // parameter and intermediate bytes
                0x20..=0x3f => continue,
                0x40..=0x7e => {
                    return Some(Self {
                        raw: &input[..idx + 3],
                        params: &body[..idx],
                        final_byte: byte,
                    });
                }
                _ => return None,
            }
        }
        // Cut mid-sequence: the caller treats the escape byte as literal text.
        None
    }
}

pub fn convert(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + SCOPE_OPEN.len() + SCOPE_CLOSE.len());
    out.push_str(SCOPE_OPEN);

    let mut idx = 0usize;
    while let Some(ch) = raw[idx..].chars().next() {
        if ch == ESC {
            let rest = &raw[idx..];
            if rest.starts_with(REDRAW_SEQUENCE) {
                idx += REDRAW_SEQUENCE.len();
                continue;
            }
            if let Some(sequence) = ControlSequence::parse(rest) {
                if sequence.final_byte == b'm' {
                    match StyleClass::from_params(sequence.params) {
                        Some(style) => style.push_switch(&mut out),
                        None => push_escaped(&mut out, sequence.params),
                    }
                } else {
                    push_escaped(&mut out, sequence.raw);
                }
                idx += sequence.raw.len();
                continue;
            }
        }
        push_escaped_char(&mut out, ch);
        idx += ch.len_utf8();
    }

    out.push_str(SCOPE_CLOSE);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        push_escaped_char(out, ch);
    }
}

fn push_escaped_char(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        other => out.push(other),
    }
}

#[cfg(test)]
#[path = "tests/markup_tests.rs"]
mod tests;
