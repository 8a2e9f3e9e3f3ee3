use crate::catalog::TestDescriptor;
use crate::logs::{LogAccumulator, ProcessEvent, ProcessId, Subscription};
use crate::selection::{self, SelectionRow};
use crate::status::{StatusTracker, TestStatusRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunUpdate {
    pub markup: String,
    pub statuses: Vec<TestStatusRecord>,
    pub producing: bool,
}

#[derive(Debug)]
pub struct RunMonitor {
    logs: LogAccumulator,
    tracker: StatusTracker,
}

impl RunMonitor {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            logs: LogAccumulator::new(),
            tracker: StatusTracker::new(project_root),
        }
    }

    pub fn start(&mut self, process: ProcessId) -> Subscription {
        self.tracker.reset();
        self.logs.attach(process)
    }

    pub fn stop(&mut self, subscription: &Subscription) -> bool {
        let detached = self.logs.detach(subscription);
        if detached {
            self.tracker.reset();
        }
        detached
    }

    pub fn apply(&mut self, event: &ProcessEvent) -> Option<RunUpdate> {
        if !self.logs.handle(event).changed() {
            return None;
        }
        Some(self.snapshot())
    }

    pub fn snapshot(&mut self) -> RunUpdate {
        RunUpdate {
            markup: self.logs.markup(),
            statuses: self.tracker.update(self.logs.current_raw()),
            producing: self.logs.is_producing(),
        }
    }

    pub fn logs(&self) -> &LogAccumulator {
        &self.logs
    }

    pub fn run_active(&self) -> bool {
        self.logs.is_producing() && !self.logs.current_raw().is_empty()
    }

    pub fn selection(
        &mut self,
        catalog: &[TestDescriptor],
        running: &[TestDescriptor],
    ) -> Vec<SelectionRow> {
        let records = self.tracker.update(self.logs.current_raw());
        selection::join(catalog, running, &records, self.run_active())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
