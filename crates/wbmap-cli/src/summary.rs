use anyhow::{Context, Result};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use wbmap_map::AutoMapperResults;
use wbmap_model::Schema;
use wbmap_rules::StaleReference;

use crate::cli::OutputArg;

pub fn print_results(results: &AutoMapperResults, output: OutputArg) -> Result<()> {
    match output {
        OutputArg::Json => {
            let json = serde_json::to_string_pretty(results).context("serialize results")?;
            println!("{json}");
        }
        OutputArg::Table => print_mapping_table(results),
    }
    Ok(())
}

fn print_mapping_table(results: &AutoMapperResults) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Header"), header_cell("Mapping paths")]);
    apply_mapping_table_style(&mut table);
    for mapping in results {
        let paths = if mapping.paths.is_empty() {
            dim_cell("-")
        } else {
            let lines: Vec<String> = mapping.paths.iter().map(ToString::to_string).collect();
            Cell::new(lines.join("\n")).fg(Color::Green)
        };
        table.add_row(vec![Cell::new(&mapping.header), paths]);
    }
    for header in results.ignored_headers() {
        table.add_row(vec![dim_cell(header), dim_cell("ignored")]);
    }
    println!("{table}");
    println!(
        "Mapped {} of {} headers ({} ignored)",
        results.mapped_headers().count(),
        results.len(),
        results.ignored_headers().len()
    );
}

pub fn print_tables(schema: &Schema) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Label"),
        header_cell("Fields"),
        header_cell("Relationships"),
        header_cell("Ranks"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for entry in schema.tables() {
        let ranks = match &entry.tree {
            Some(tree) => Cell::new(tree.ranks.join(", ")),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&entry.display_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&entry.label),
            Cell::new(entry.fields.len()),
            Cell::new(entry.relationships.len()),
            ranks,
        ]);
    }
    println!("{table}");
}

pub fn print_stale_references(stale: &[StaleReference]) {
    if stale.is_empty() {
        println!("No stale rule references.");
        return;
    }
    eprintln!("Stale rule references:");
    for reference in stale {
        eprintln!("- {reference}");
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_mapping_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Percentage(35)),
        ColumnConstraint::LowerBoundary(Width::Fixed(20)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
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
