use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::TestDescriptor;
use crate::locator::CaseKey;
use crate::status::{latest_by_case, TestStatus, TestStatusRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveStatus {
    Idle,
    Pass,
    Fail,
}

impl From<TestStatus> for EffectiveStatus {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Pass => EffectiveStatus::Pass,
            TestStatus::Fail => EffectiveStatus::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    Unselected,
    Pending,
    Passed,
    Failed,
    Skipped,
}

impl DisplayState {
    pub fn label(self) -> &'static str {
        match self {
            DisplayState::Unselected => "-",
            DisplayState::Pending => "pending",
            DisplayState::Passed => "pass",
            DisplayState::Failed => "fail",
            DisplayState::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionRow {
    pub test: TestDescriptor,
    pub selected: bool,
    pub status: EffectiveStatus,
    pub display: DisplayState,
}

pub fn effective_status(
    test: &TestDescriptor,
    latest: &IndexMap<CaseKey, TestStatus>,
) -> EffectiveStatus {
    latest
        .get(&test.case_key())
        .copied()
        .map_or(EffectiveStatus::Idle, EffectiveStatus::from)
}

pub fn join(
    catalog: &[TestDescriptor],
    running: &[TestDescriptor],
    records: &[TestStatusRecord],
    run_active: bool,
) -> Vec<SelectionRow> {
    let latest = latest_by_case(records);
    catalog
        .iter()
        .map(|test| {
            let selected = running.contains(test);
            let status = if selected {
                effective_status(test, &latest)
            } else {
                EffectiveStatus::Idle
            };
            let display = match (selected, status) {
                (false, _) => DisplayState::Unselected,
                (true, EffectiveStatus::Pass) => DisplayState::Passed,
                (true, EffectiveStatus::Fail) => DisplayState::Failed,
                (true, EffectiveStatus::Idle) if run_active => DisplayState::Pending,
                (true, EffectiveStatus::Idle) => DisplayState::Skipped,
            };
            SelectionRow {
                test: test.clone(),
                selected,
                status,
                display,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
