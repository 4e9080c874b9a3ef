use pm_core::service::Advisory;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Left-aligned columns separated by two spaces. Widths count chars so
/// non-ASCII titles line up.
pub fn print_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    println!("{}", table_line(headers.iter().copied(), &widths));
    let rules = widths.map(|w| "-".repeat(w));
    println!("{}", table_line(rules.iter().map(String::as_str), &widths));
    for row in rows {
        println!("{}", table_line(row.iter().map(String::as_str), &widths));
    }
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// One line per side effect that did something or went wrong.
pub fn print_advisory(label: &str, advisory: &Advisory) {
    match advisory {
        Advisory::Applied(detail) => println!("  {label}: {detail}"),
        Advisory::Failed(reason) => println!("  {label}: skipped ({reason})"),
        Advisory::Skipped(_) => {}
    }
}
