//! Companion HTML report for a point-value table.

use std::fmt::Write;

use chrono::DateTime;

use super::{TimeSeriesTable, TIME_COLUMN};

/// Report body for a run that produced no rows.
pub fn no_data_marker(display_name: &str) -> String {
    format!("<h1>No {display_name} point values.</h1>")
}

/// Render `table` as a standalone HTML page, or the no-data marker.
pub fn render_report(table: &TimeSeriesTable, display_name: &str) -> String {
    if table.is_empty() {
        return no_data_marker(display_name);
    }

    let title = format!("{} averaged values per point index every second", escape(display_name));
    let mut html = String::with_capacity(256 + table.num_rows() * table.num_columns() * 16);

    // Writing to a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:2px 6px;text-align:right}}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n<table>\n<thead><tr><th>{TIME_COLUMN}</th>"
    );
    for name in table.column_names() {
        let _ = write!(html, "<th>{}</th>", escape(name));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    let columns: Vec<&[f64]> = table
        .column_names()
        .filter_map(|name| table.column(name))
        .collect();
    for (row, micros) in table.times().iter().enumerate() {
        let _ = write!(html, "<tr><td>{}</td>", format_time(*micros));
        for cells in &columns {
            let _ = write!(html, "<td>{}</td>", cells[row]);
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

fn format_time(micros: i64) -> String {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| micros.to_string())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
