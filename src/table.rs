//! Plain-text rendering of report tables.
//!
//! Columns whose cells are all numeric are right-aligned; everything else is
//! left-aligned. Control whitespace inside cells is flattened to spaces so a
//! record always occupies one line.

use std::fmt::Write as _;

use crate::data::parse_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h)).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(cell_width(cell));
        }
    }
    let aligns: Vec<Align> = (0..column_count)
        .map(|idx| column_alignment(rows, idx))
        .collect();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths, &aligns));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    let rule_widths: Vec<usize> = widths.iter().map(|w| (*w).max(3)).collect();
    let _ = writeln!(
        output,
        "{}",
        format_line(&rule, &rule_widths, &vec![Align::Left; column_count])
    );
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths, &aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn column_alignment(rows: &[Vec<String>], idx: usize) -> Align {
    let mut cells = rows
        .iter()
        .filter_map(|row| row.get(idx))
        .map(|cell| cell.trim_end_matches('%'))
        .filter(|cell| !cell.is_empty())
        .peekable();
    if cells.peek().is_some() && cells.all(|cell| parse_number(cell).is_some()) {
        Align::Right
    } else {
        Align::Left
    }
}

fn format_line(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .zip(aligns)
        .map(|((value, width), align)| {
            let flat = flatten(value);
            let padding = " ".repeat(width.saturating_sub(cell_width(&flat)));
            match align {
                Align::Left => format!("{flat}{padding}"),
                Align::Right => format!("{padding}{flat}"),
            }
        })
        .collect();
    cells.join("  ").trim_end().to_string()
}

fn cell_width(value: &str) -> usize {
    value.chars().count().max(1)
}

fn flatten(value: &str) -> String {
    value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch })
        .collect()
}
