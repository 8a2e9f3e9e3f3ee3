use indexmap::IndexMap;
use serde::Serialize;

use crate::locator::{
    case_title, case_word, is_word_byte, normalize_locator, CaseKey, FIELD_SEPARATOR,
};

const PASS_GLYPH: char = '✓';
const FAIL_GLYPH: char = '✘';
const INDENT: &str = "  ";
const GLYPH_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    pub fn label(self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestStatusRecord {
    pub kind: String,
    pub path: String,
    pub status: TestStatus,
    pub name: String,
    pub title: String,
}

impl TestStatusRecord {
    pub fn case_key(&self) -> CaseKey {
        CaseKey::new(self.path.clone(), &self.title)
    }
}

// `  ✓  12 [chromium] › tests/foo.spec.ts:10:5 › does thing (1.2s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StatusLine<'a> {
    status: TestStatus,
    tag: &'a str,
    locator: &'a str,
    title: &'a str,
    name: &'a str,
}

impl<'a> StatusLine<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let rest = line.strip_prefix(INDENT)?;

        let mut chars = rest.chars();
        let status = match chars.next()? {
            PASS_GLYPH => TestStatus::Pass,
            FAIL_GLYPH => TestStatus::Fail,
            _ => return None,
        };
        let rest = chars.as_str().strip_prefix(GLYPH_GAP)?;

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let rest = rest[digits..].strip_prefix(" [")?;

        let close = rest.find(']')?;
        let tag = &rest[..close];
        if tag.is_empty() || !tag.bytes().all(is_word_byte) {
            return None;
        }
        let rest = rest[close + 1..].strip_prefix(FIELD_SEPARATOR)?;

        let (locator, title) = rest.split_once(FIELD_SEPARATOR)?;
        if locator.is_empty() || !locator.bytes().all(is_locator_byte) {
            return None;
        }
        let title = case_title(title);
        let name = case_word(title)?;

        Some(Self {
            status,
            tag,
            locator,
            title,
            name,
        })
    }

    fn into_record(self, project_root: &str) -> TestStatusRecord {
        TestStatusRecord {
            kind: self.tag.to_owned(),
            path: normalize_locator(self.locator, project_root),
            status: self.status,
            name: self.name.to_owned(),
            title: self.title.to_owned(),
        }
    }
}

fn is_locator_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b':' | b'-' | b'_' | b'/' | b'.' | b' ')
}

pub fn parse_status_line(line: &str, project_root: &str) -> Option<TestStatusRecord> {
    StatusLine::parse(line).map(|parsed| parsed.into_record(project_root))
}

pub fn extract_statuses(run_log: &str, project_root: &str) -> Vec<TestStatusRecord> {
    run_log
        .split('\n')
        .filter_map(|line| parse_status_line(line, project_root))
        .collect()
}

pub fn latest_by_case(records: &[TestStatusRecord]) -> IndexMap<CaseKey, TestStatus> {
    let mut latest = IndexMap::with_capacity(records.len());
    for record in records {
        latest.insert(record.case_key(), record.status);
    }
    latest
}

#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    project_root: String,
    cursor: usize,
    committed: Vec<TestStatusRecord>,
}

impl StatusTracker {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            cursor: 0,
            committed: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.committed.clear();
    }

    pub fn update(&mut self, raw: &str) -> Vec<TestStatusRecord> {
        let pending = match raw.get(self.cursor..) {
            Some(pending) => pending,
            None => {
                // Buffer shrank or was swapped underneath us.
                self.reset();
                raw
            }
        };

        let consumed = pending.rfind('\n').map_or(0, |idx| idx + 1);
        let project_root = self.project_root.as_str();
        self.committed.extend(
            pending[..consumed]
                .split('\n')
                .filter_map(|line| parse_status_line(line, project_root)),
        );
        self.cursor += consumed;

        let mut records = self.committed.clone();
        records.extend(parse_status_line(&pending[consumed..], project_root));
        records
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
