use std::fmt;

use tracing::debug;

use crate::markup;

pub const EXIT_LINE_PREFIX: &str = "Process terminated with exit code: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl ProcessId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Output {
        process: ProcessId,
        stream: OutputStream,
        text: String,
    },
    Exit {
        process: ProcessId,
        code: i32,
    },
}

impl ProcessEvent {
    pub fn stdout(process: ProcessId, text: impl Into<String>) -> Self {
        ProcessEvent::Output {
            process,
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(process: ProcessId, text: impl Into<String>) -> Self {
        ProcessEvent::Output {
            process,
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }

    pub fn process(&self) -> ProcessId {
        match self {
            ProcessEvent::Output { process, .. } | ProcessEvent::Exit { process, .. } => *process,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
    raw: String,
    finalized: bool,
}

impl LogBuffer {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn append(&mut self, text: &str) {
        self.raw.push_str(text);
    }

    fn finalize(&mut self, code: i32) {
        if !self.raw.is_empty() && !self.raw.ends_with('\n') {
            self.raw.push('\n');
        }
        self.raw.push_str(EXIT_LINE_PREFIX);
        self.raw.push_str(&code.to_string());
        self.raw.push('\n');
        self.finalized = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Ignored,
    Appended,
    Finalized,
}

impl Mutation {
    pub fn changed(self) -> bool {
        !matches!(self, Mutation::Ignored)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    process: ProcessId,
    generation: u64,
}

impl Subscription {
    pub fn process(&self) -> ProcessId {
        self.process
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Attached {
    process: ProcessId,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct LogAccumulator {
    attached: Option<Attached>,
    generation: u64,
    buffer: LogBuffer,
}

impl LogAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, process: ProcessId) -> Subscription {
        self.generation += 1;
        self.attached = Some(Attached {
            process,
            generation: self.generation,
        });
        self.buffer = LogBuffer::default();
        debug!(%process, generation = self.generation, "attached log buffer");
        Subscription {
            process,
            generation: self.generation,
        }
    }

    /// No-op returning `false` once a newer process has been attached.
    pub fn detach(&mut self, subscription: &Subscription) -> bool {
        match self.attached {
            Some(attached) if attached.generation == subscription.generation => {
                self.attached = None;
                self.buffer = LogBuffer::default();
                debug!(process = %subscription.process, "detached log buffer");
                true
            }
            _ => false,
        }
    }

    pub fn handle(&mut self, event: &ProcessEvent) -> Mutation {
        match event {
            ProcessEvent::Output {
                process,
                stream,
                text,
            } => self.on_chunk(*process, *stream, text),
            ProcessEvent::Exit { process, code } => self.on_exit(*process, *code),
        }
    }

    pub fn on_chunk(&mut self, process: ProcessId, stream: OutputStream, text: &str) -> Mutation {
        if !self.accepts(process) {
            debug!(%process, ?stream, bytes = text.len(), "ignored chunk from stale process");
            return Mutation::Ignored;
        }
        if text.is_empty() {
            return Mutation::Ignored;
        }
        self.buffer.append(text);
        Mutation::Appended
    }

    pub fn on_exit(&mut self, process: ProcessId, code: i32) -> Mutation {
        if !self.accepts(process) {
            debug!(%process, code, "ignored exit from stale process");
            return Mutation::Ignored;
        }
        self.buffer.finalize(code);
        debug!(%process, code, "finalized log buffer");
        Mutation::Finalized
    }

    pub fn current_raw(&self) -> &str {
        self.buffer.raw()
    }

    pub fn markup(&self) -> String {
        markup::convert(self.buffer.raw())
    }

    pub fn current_process(&self) -> Option<ProcessId> {
        self.attached.map(|attached| attached.process)
    }

    pub fn is_producing(&self) -> bool {
        self.attached.is_some() && !self.buffer.is_finalized()
    }

    fn accepts(&self, process: ProcessId) -> bool {
        self.attached
            .is_some_and(|attached| attached.process == process && !self.buffer.is_finalized())
    }
}

#[cfg(test)]
#[path = "tests/logs_tests.rs"]
mod tests;
