use crate::models::{Cell, ResultSet};

pub const DEFAULT_PREVIEW_ROWS: usize = 20;
const MAX_CELL_WIDTH: usize = 24;

/// Plain-text table of the first `max_rows` rows with a row-count footer.
#[must_use]
pub fn render_table(result: &ResultSet, max_rows: usize) -> String {
    if result.columns.is_empty() {
        return "(no columns)\n".to_string();
    }

    let shown = &result.rows[..result.len().min(max_rows)];
    let rendered = shown
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| (clip(&cell.to_string()), is_numeric(cell)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = result
        .columns
        .iter()
        .map(|column| clip(column).chars().count())
        .collect::<Vec<_>>();
    for row in &rendered {
        for (width, (text, _)) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rendered.len() + 3);
    lines.push(
        result
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| pad(&clip(column), *width, false))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rendered {
        lines.push(
            row.iter()
                .zip(&widths)
                .map(|((text, numeric), width)| pad(text, *width, *numeric))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    lines.push(footer(result, shown.len()));

    let mut output = lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    output.push('\n');
    output
}

fn footer(result: &ResultSet, shown: usize) -> String {
    let mut footer = if shown < result.len() {
        format!("showing {shown} of {} rows", result.len())
    } else if result.len() == 1 {
        "1 row".to_string()
    } else {
        format!("{} rows", result.len())
    };
    if result.truncated {
        footer.push_str(" (row ceiling reached)");
    }
    footer
}

fn is_numeric(cell: &Cell) -> bool {
    matches!(cell, Cell::Integer(_) | Cell::Real(_))
}

fn clip(value: &str) -> String {
    let single_line = value.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= MAX_CELL_WIDTH {
        return single_line;
    }
    let mut clipped = single_line
        .chars()
        .take(MAX_CELL_WIDTH - 1)
        .collect::<String>();
    clipped.push('…');
    clipped
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}
