//! Table rendering: cell cleanup, HTML, and CSV.
//!
//! All functions here are total. They never see page context and never fail
//! on ragged or sparse grids.

use crate::error::{Error, Result};
use crate::model::{ExtractedTable, RawTable, TableCell};

/// Normalize a raw cell: missing cells become empty, others are trimmed.
pub fn clean_cell(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn clean_row(row: &[Option<String>]) -> Vec<String> {
    row.iter().map(|c| clean_cell(c.as_deref())).collect()
}

/// Check whether a grid carries no rows at all.
pub fn is_empty_grid(grid: &RawTable) -> bool {
    grid.is_empty()
}

/// Render a grid as an HTML table.
///
/// Row 0 is emitted as `<th>` cells, every other row as `<td>` cells.
/// Cell text is HTML-escaped. An empty grid renders as an empty string.
pub fn to_html(grid: &RawTable) -> String {
    if is_empty_grid(grid) {
        return String::new();
    }

    let mut output = String::from("<table>\n");
    for (i, row) in grid.iter().enumerate() {
        let tag = if i == 0 { "th" } else { "td" };
        output.push_str("<tr>");
        for cell in row {
            let text = clean_cell(cell.as_deref());
            output.push_str(&format!(
                "<{tag}>{}</{tag}>",
                html_escape::encode_text(&text),
                tag = tag
            ));
        }
        output.push_str("</tr>\n");
    }
    output.push_str("</table>");
    output
}

/// Render a grid as CSV with standard quoting and `\n` record terminators.
///
/// An empty grid renders as an empty string.
pub fn to_csv(grid: &RawTable) -> String {
    match try_to_csv(grid) {
        Ok(csv) => csv,
        Err(e) => {
            log::warn!("CSV rendering failed: {}", e);
            String::new()
        }
    }
}

fn try_to_csv(grid: &RawTable) -> Result<String> {
    if is_empty_grid(grid) {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in grid {
        writer.write_record(clean_row(row))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Render(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Render(e.to_string()))
}

/// Build an [`ExtractedTable`] from a raw grid found on `page`.
///
/// Returns `None` for grids with no rows. Row 0 becomes the header; ragged
/// rows contribute only the cells they have.
pub fn build_table(page: u32, grid: &RawTable) -> Option<ExtractedTable> {
    let (header, body) = grid.split_first()?;

    let headers = clean_row(header);
    let raw_rows: Vec<Vec<String>> = body.iter().map(|r| clean_row(r)).collect();

    let cells = std::iter::once(&headers)
        .chain(raw_rows.iter())
        .enumerate()
        .flat_map(|(row, texts)| {
            texts
                .iter()
                .enumerate()
                .map(move |(col, text)| TableCell::new(text.clone(), row, col))
        })
        .collect();

    Some(ExtractedTable {
        page,
        rows_count: grid.len(),
        cols_count: header.len(),
        cells,
        headers,
        raw_rows,
        html: to_html(grid),
        csv: to_csv(grid),
        confidence: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[Option<&str>]]) -> RawTable {
        rows.iter()
            .map(|r| r.iter().map(|c| c.map(String::from)).collect())
            .collect()
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell(None), "");
        assert_eq!(clean_cell(Some("  padded \n")), "padded");
        assert_eq!(clean_cell(Some("")), "");
        assert_eq!(clean_cell(Some("a b")), "a b");
    }

    #[test]
    fn test_to_html_header_and_body() {
        let g = grid(&[&[Some("Name"), Some("Age")], &[Some("Alice"), Some("30")]]);
        let html = to_html(&g);
        assert_eq!(
            html,
            "<table>\n<tr><th>Name</th><th>Age</th></tr>\n<tr><td>Alice</td><td>30</td></tr>\n</table>"
        );
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn test_to_html_escapes_and_fills_missing() {
        let g = grid(&[&[Some("a<b"), None], &[Some("R&D"), Some(" x ")]]);
        let html = to_html(&g);
        assert!(html.contains("<th>a&lt;b</th><th></th>"));
        assert!(html.contains("<td>R&amp;D</td><td>x</td>"));
    }

    #[test]
    fn test_empty_grid_renders_empty() {
        let g: RawTable = vec![];
        assert_eq!(to_html(&g), "");
        assert_eq!(to_csv(&g), "");
        assert!(build_table(1, &g).is_none());
    }

    #[test]
    fn test_to_csv_quoting() {
        let g = grid(&[
            &[Some("Item"), Some("Note")],
            &[Some("Widget, large"), Some("says \"hi\"")],
            &[None, Some("  ")],
        ]);
        assert_eq!(
            to_csv(&g),
            "Item,Note\n\"Widget, large\",\"says \"\"hi\"\"\"\n,\n"
        );
    }

    #[test]
    fn test_csv_parses_back_to_grid_shape() {
        let g = grid(&[
            &[Some("a"), Some("b"), Some("c")],
            &[Some("1"), Some("2,5"), Some("3")],
            &[Some("x"), None, Some("z\nz")],
        ]);
        let csv = to_csv(&g);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(csv.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.len() == 3));
        assert_eq!(&records[1][1], "2,5");
        assert_eq!(&records[2][2], "z\nz");
    }

    #[test]
    fn test_build_table_rectangular() {
        let g = grid(&[
            &[Some("H1"), Some("H2"), Some("H3")],
            &[Some("a"), Some("b"), Some("c")],
            &[Some("d"), None, Some("f")],
        ]);
        let table = build_table(4, &g).unwrap();
        assert_eq!(table.page, 4);
        assert_eq!(table.rows_count, 3);
        assert_eq!(table.cols_count, 3);
        assert_eq!(table.cells.len(), 9);
        assert_eq!(table.headers, vec!["H1", "H2", "H3"]);
        assert_eq!(table.raw_rows.len(), 2);
        assert_eq!(table.raw_rows[1], vec!["d", "", "f"]);
        assert_eq!(table.cell(0, 2).unwrap().text, "H3");
        assert_eq!(table.cell(2, 1).unwrap().text, "");
        assert_eq!(table.confidence, 1.0);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_build_table_ragged_rows() {
        let g = grid(&[
            &[Some("A"), Some("B")],
            &[Some("only")],
            &[Some("x"), Some("y"), Some("z")],
        ]);
        let table = build_table(1, &g).unwrap();
        assert_eq!(table.rows_count, 3);
        assert_eq!(table.cols_count, 2);
        assert_eq!(table.cells.len(), 6);
        assert!(!table.is_rectangular());
        assert_eq!(table.csv, "A,B\nonly\nx,y,z\n");
    }

    #[test]
    fn test_build_table_header_only() {
        let g = grid(&[&[Some("Lonely"), Some("Header")]]);
        let table = build_table(2, &g).unwrap();
        assert_eq!(table.rows_count, 1);
        assert!(table.raw_rows.is_empty());
        assert_eq!(table.rows_count, 1 + table.raw_rows.len());
    }
}
