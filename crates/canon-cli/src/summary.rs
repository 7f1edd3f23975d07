use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use canon_model::{IssueSeverity, ValidationIssue};

use crate::types::TransformResult;

pub fn print_summary(result: &TransformResult) {
    println!("Tenant: {}", result.tenant);
    println!("Input: {}", result.input.display());
    match &result.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: (dry run)"),
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Resource"),
        header_cell("Total"),
        header_cell("Transformed"),
        header_cell("Aborted"),
        header_cell("Embedded"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut totals = [0usize; 4];
    for summary in &result.types {
        totals[0] += summary.total;
        totals[1] += summary.transformed;
        totals[2] += summary.aborted;
        totals[3] += summary.embedded;
        table.add_row(vec![
            Cell::new(summary.resource_type)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.total),
            count_cell(summary.transformed, Color::Green),
            count_cell(summary.aborted, Color::Red),
            count_cell(summary.embedded, Color::Cyan),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(totals[0]).add_attribute(Attribute::Bold),
        count_cell(totals[1], Color::Green).add_attribute(Attribute::Bold),
        count_cell(totals[2], Color::Red).add_attribute(Attribute::Bold),
        count_cell(totals[3], Color::Cyan).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_issue_table(result);
}

fn print_issue_table(result: &TransformResult) {
    let mut issues: Vec<(String, &str, &ValidationIssue)> = Vec::new();
    for report in &result.reports {
        let resource = match &report.resource_id {
            Some(id) => format!("{}/{id}", report.resource_type),
            None => report.resource_type.clone(),
        };
        for issue in &report.issues {
            issues.push((resource.clone(), report.id.as_str(), issue));
        }
    }
    if issues.is_empty() {
        return;
    }
    issues.sort_by(|a, b| {
        severity_rank(b.2.severity)
            .cmp(&severity_rank(a.2.severity))
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.2.code.cmp(&b.2.code))
    });
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Resource"),
        header_cell("Severity"),
        header_cell("Field"),
        header_cell("Code"),
        header_cell("Message"),
        header_cell("Report"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for (resource, report_id, issue) in issues {
        let field = if issue.location.field.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(format!("{}.{}", issue.location.element, issue.location.field))
        };
        table.add_row(vec![
            Cell::new(resource),
            severity_cell(issue.severity),
            field,
            Cell::new(&issue.code),
            Cell::new(&issue.description),
            dim_cell(report_id),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::UpperBoundary(Width::Fixed(22)),
            ColumnConstraint::UpperBoundary(Width::Percentage(45)),
            ColumnConstraint::LowerBoundary(Width::Fixed(16)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
        IssueSeverity::Info => Cell::new("INFO").fg(Color::DarkGrey),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 2,
        IssueSeverity::Warning => 1,
        IssueSeverity::Info => 0,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
