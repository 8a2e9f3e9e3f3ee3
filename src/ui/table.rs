use tabled::builder::Builder;
use tabled::settings::Style;

use crate::ui::widgets::TableSpec;

pub fn render_table(spec: &TableSpec) -> String {
    if spec.rows.is_empty() {
        return String::new();
    }
    let mut builder = Builder::default();
    if !spec.headers.is_empty() {
        builder.push_record(spec.headers.iter().map(String::as_str));
    }
    for row in &spec.rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    let mut table = builder.build();
    table.with(Style::psql());
    // Padding leaves trailing blanks after the last column.
    table
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
