use crate::selection::DisplayState;
use crate::status::TestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMark {
    Idle,
    Pending,
    Passed,
    Failed,
    Skipped,
}

impl From<TestStatus> for ResultMark {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Pass => ResultMark::Passed,
            TestStatus::Fail => ResultMark::Failed,
        }
    }
}

impl From<DisplayState> for ResultMark {
    fn from(state: DisplayState) -> Self {
        match state {
            DisplayState::Unselected => ResultMark::Idle,
            DisplayState::Pending => ResultMark::Pending,
            DisplayState::Passed => ResultMark::Passed,
            DisplayState::Failed => ResultMark::Failed,
            DisplayState::Skipped => ResultMark::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    pub title: String,
    pub body: String,
    pub hint: Option<String>,
    pub detail: Option<String>,
}

impl MessageBlock {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            hint: None,
            detail: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub passed: usize,
    pub failed: usize,
    pub idle: usize,
}

impl SummaryCounts {
    pub fn record(&mut self, mark: ResultMark) {
        match mark {
            ResultMark::Passed => self.passed += 1,
            ResultMark::Failed => self.failed += 1,
            ResultMark::Idle | ResultMark::Pending | ResultMark::Skipped => self.idle += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }
}
