pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod env_vars;
pub mod fixtures;
pub mod invocation;
pub mod locator;
pub mod logs;
pub mod markup;
pub mod resolver;
pub mod runner;
pub mod selection;
pub mod sequence;
pub mod session;
pub mod status;
pub mod ui;

pub use catalog::{Catalog, CatalogError, CatalogOutcome, TestDescriptor, TestKind};
pub use cli::{Cli, Command};
pub use fixtures::{scan_auth_fixtures, AuthFixture, FixtureError};
pub use logs::{LogAccumulator, ProcessEvent, ProcessId};
pub use session::{RunMonitor, RunUpdate};
pub use status::{extract_statuses, TestStatus, TestStatusRecord};
