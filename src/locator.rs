use serde::Serialize;

pub const FIELD_SEPARATOR: &str = " › ";

const FILE_SCHEME: &str = "file:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CaseKey {
    pub path: String,
    pub title: String,
}

impl CaseKey {
    pub fn new(path: impl Into<String>, title: &str) -> Self {
        Self {
            path: path.into(),
            title: case_title(title).to_owned(),
        }
    }
}

pub fn normalize_locator(fragment: &str, project_root: &str) -> String {
    let without_scheme = match fragment.rfind(FILE_SCHEME) {
        Some(idx) => &fragment[idx + FILE_SCHEME.len()..],
        None => fragment,
    };
    let path = strip_line_col(without_scheme.trim());
    relative_to_root(path, project_root)
}

pub fn case_title(title: &str) -> &str {
    let title = strip_timing(title.trim());
    strip_retry(title).trim_end()
}

pub fn case_word(title: &str) -> Option<&str> {
    let bytes = title.as_bytes();
    let end = bytes.iter().rposition(|byte| is_word_byte(*byte))? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|byte| !is_word_byte(*byte))
        .map_or(0, |idx| idx + 1);
    Some(&title[start..end])
}

fn trailing_group(title: &str) -> Option<(&str, &str)> {
    let inner = title.strip_suffix(')')?;
    let open = inner.rfind(" (")?;
    Some((&inner[..open], &inner[open + 2..]))
}

fn strip_timing(title: &str) -> &str {
    let Some((head, timing)) = trailing_group(title) else {
        return title;
    };
    let number_len = timing
        .bytes()
        .take_while(|byte| byte.is_ascii_digit() || *byte == b'.')
        .count();
    let unit = &timing[number_len..];
    if number_len == 0 || unit.is_empty() || !unit.bytes().all(|byte| byte.is_ascii_lowercase()) {
        return title;
    }
    head
}

fn strip_retry(title: &str) -> &str {
    match trailing_group(title) {
        Some((head, group)) if group.strip_prefix("retry #").is_some_and(is_digits) => head,
        _ => title,
    }
}

pub(crate) fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn strip_line_col(path: &str) -> &str {
    let Some((head, col)) = path.rsplit_once(':') else {
        return path;
    };
    let Some((head, line)) = head.rsplit_once(':') else {
        return path;
    };
    if is_digits(line) && is_digits(col) {
        head
    } else {
        path
    }
}

fn is_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit())
}

fn relative_to_root(path: &str, project_root: &str) -> String {
    let root = project_root.trim_end_matches('/');
    if !root.is_empty() {
        if let Some(rest) = path.strip_prefix(root) {
            if rest.is_empty() {
                return "/".to_owned();
            }
            if rest.starts_with('/') {
                return rest.to_owned();
            }
        }
    }
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}
