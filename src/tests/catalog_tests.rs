use super::{load_catalog, parse_catalog, CatalogError, CatalogOutcome, ListSource, TestKind};
use crate::invocation::ToolOutput;
use std::collections::VecDeque;

const SAMPLE_LISTING: &str = "\
Listing tests:
  [setup] › file:/work/app/setup/auth.setup.ts:3:1 › login
  [chromium] › file:/work/app/tests/dashboard.spec.ts:10:5 › shows widgets
  [chromium] › file:/work/app/tests/dashboard.spec.ts:22:5 › hides widgets
Total: 3 tests in 2 files
";

#[test]
fn parses_single_setup_entry() {
    let output = "Listing tests:\n[setup] › file:/root/a.ts:3:1 › login\nTotal: 1\n";
    let catalog = parse_catalog(output, "/root").expect("parse");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].kind, TestKind::AuthSetup);
    assert_eq!(catalog[0].path, "/a.ts");
    assert_eq!(catalog[0].name, "login");
}

#[test]
fn keeps_order_and_duplicate_paths() {
    let catalog = parse_catalog(SAMPLE_LISTING, "/work/app").expect("parse");
    let rows = catalog
        .iter()
        .map(|test| (test.kind, test.path.as_str(), test.name.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            (TestKind::AuthSetup, "/setup/auth.setup.ts", "login"),
            (TestKind::Test, "/tests/dashboard.spec.ts", "shows widgets"),
            (TestKind::Test, "/tests/dashboard.spec.ts", "hides widgets"),
        ]
    );
}

#[test]
fn ignores_noise_outside_markers_and_blank_lines() {
    let output = "npm WARN something\nListing tests:\n\n[firefox] › file:/r/x.ts:1:1 › a\n\nTotal: 1\ntrailing noise\n";
    let catalog = parse_catalog(output, "/r").expect("parse");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].path, "/x.ts");
}

#[test]
fn tolerates_crlf_line_endings() {
    let output = "Listing tests:\r\n[chromium] › file:/r/x.ts:1:1 › a\r\nTotal: 1\r\n";
    let catalog = parse_catalog(output, "/r").expect("parse");
    assert_eq!(catalog[0].name, "a");
}

#[test]
fn drops_lines_with_wrong_field_count() {
    let output = "Listing tests:\n[chromium] › file:/r/x.ts:1:1 › suite › nested\n[chromium] › file:/r/y.ts:1:1\n[chromium] › file:/r/z.ts:1:1 › ok\nTotal: 3\n";
    let catalog = parse_catalog(output, "/r").expect("parse");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].path, "/z.ts");
}

#[test]
fn missing_footer_is_a_shape_error() {
    let output = "Listing tests:\n[setup] › file:/root/a.ts:3:1 › login\n";
    let err = parse_catalog(output, "/root").expect_err("missing footer");
    assert!(matches!(err, CatalogError::UnexpectedFormat { .. }));
    assert_eq!(err.diagnostic(), Some(output));
}

#[test]
fn missing_header_is_a_shape_error() {
    let err = parse_catalog("Total: 0\n", "/root").expect_err("missing header");
    assert!(matches!(err, CatalogError::UnexpectedFormat { .. }));
}

#[test]
fn footer_before_header_is_a_shape_error() {
    let output = "Total: 1\nListing tests:\n[x] › file:/r/a.ts:1:1 › a\n";
    let err = parse_catalog(output, "/r").expect_err("footer first");
    assert!(matches!(err, CatalogError::UnexpectedFormat { .. }));
}

#[test]
fn first_footer_anywhere_decides_even_with_a_later_one() {
    let output = "Total: 0\nListing tests:\n[x] › file:/r/a.ts:1:1 › a\nTotal: 1\n";
    let err = parse_catalog(output, "/r").expect_err("first footer precedes header");
    assert!(matches!(err, CatalogError::UnexpectedFormat { .. }));
}

#[test]
fn empty_listing_between_markers_parses_to_empty_catalog() {
    let catalog = parse_catalog("Listing tests:\nTotal: 0 tests in 0 files\n", "/r").expect("parse");
    assert!(catalog.is_empty());
}

#[test]
fn case_key_uses_the_full_title() {
    let catalog = parse_catalog(SAMPLE_LISTING, "/work/app").expect("parse");
    let key = catalog[1].case_key();
    assert_eq!(key.path, "/tests/dashboard.spec.ts");
    assert_eq!(key.title, "shows widgets");
}

struct ScriptedSource {
    responses: VecDeque<ToolOutput>,
    calls: Vec<Option<String>>,
}

impl ScriptedSource {
    fn new(responses: Vec<ToolOutput>) -> Self {
        Self {
            responses: responses.into(),
            calls: Vec::new(),
        }
    }
}

impl ListSource for ScriptedSource {
    fn list(&mut self, filter: Option<&str>) -> Result<ToolOutput, CatalogError> {
        self.calls.push(filter.map(str::to_owned));
        Ok(self.responses.pop_front().expect("scripted response"))
    }
}

fn stdout(text: &str) -> ToolOutput {
    ToolOutput {
        stdout: text.to_owned(),
        stderr: String::new(),
    }
}

fn stderr(text: &str) -> ToolOutput {
    ToolOutput {
        stdout: String::new(),
        stderr: text.to_owned(),
    }
}

#[test]
fn load_lists_once_when_tool_is_clean() {
    let mut source = ScriptedSource::new(vec![stdout(SAMPLE_LISTING)]);
    let outcome = load_catalog(&mut source, Some("dashboard"), "/work/app").expect("load");
    assert_eq!(outcome.tests().len(), 3);
    assert_eq!(source.calls, vec![Some("dashboard".to_owned())]);
}

#[test]
fn load_retries_once_after_transient_diagnostic() {
    let mut source = ScriptedSource::new(vec![stderr("installing browsers..."), stdout(SAMPLE_LISTING)]);
    let outcome = load_catalog(&mut source, None, "/work/app").expect("load");
    assert!(matches!(outcome, CatalogOutcome::Listed(ref tests) if tests.len() == 3));
    assert_eq!(source.calls.len(), 2);
}

#[test]
fn load_surfaces_second_diagnostic_verbatim() {
    let mut source = ScriptedSource::new(vec![
        stderr("first failure\n"),
        stderr("  Error: config not found\n"),
    ]);
    let err = load_catalog(&mut source, None, "/work/app").expect_err("diagnostic");
    match &err {
        CatalogError::ToolDiagnostic { diagnostic } => {
            assert_eq!(diagnostic, "Error: config not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("failed to list tests:\n"));
    assert_eq!(source.calls.len(), 2);
}

#[test]
fn whitespace_only_stderr_is_not_a_diagnostic() {
    let mut source = ScriptedSource::new(vec![ToolOutput {
        stdout: SAMPLE_LISTING.to_owned(),
        stderr: "  \n".to_owned(),
    }]);
    load_catalog(&mut source, None, "/work/app").expect("load");
    assert_eq!(source.calls.len(), 1);
}

#[test]
fn load_does_not_retry_shape_errors() {
    let mut source = ScriptedSource::new(vec![stdout("Error: no tests\n")]);
    let err = load_catalog(&mut source, None, "/work/app").expect_err("shape");
    assert!(matches!(err, CatalogError::UnexpectedFormat { .. }));
    assert_eq!(source.calls.len(), 1);
}

#[test]
fn empty_listing_is_informational() {
    let mut source = ScriptedSource::new(vec![stdout("Listing tests:\nTotal: 0 tests in 0 files\n")]);
    let outcome = load_catalog(&mut source, Some("nothing"), "/work/app").expect("load");
    assert_eq!(
        outcome,
        CatalogOutcome::NoMatches {
            filter: Some("nothing".to_owned())
        }
    );
    assert_eq!(outcome.to_string(), "No tests matched current grep \"nothing\"");

    let unfiltered = CatalogOutcome::NoMatches { filter: None };
    assert_eq!(unfiltered.to_string(), "No tests found.");
    assert!(unfiltered.tests().is_empty());
}
