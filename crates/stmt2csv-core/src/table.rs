use serde::{Deserialize, Serialize};

/// An assembled statement table, ready to render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Free-text line written before the header (statement title).
    pub title: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn num_columns(&self) -> usize {
        self.header.len()
    }

    /// Render as CSV: optional title line, header line, one line per row.
    ///
    /// The title is written verbatim. Lines are joined with `\n` and there is no trailing newline.
    pub fn to_csv(&self, include_title: bool) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        if include_title {
            if let Some(ref title) = self.title {
                lines.push(title.clone());
            }
        }
        lines.push(csv_line(&self.header));
        lines.extend(self.rows.iter().map(|row| csv_line(row)));
        lines.join("\n")
    }
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| escape_csv(cell))
        .collect::<Vec<_>>()
        .join(",")
}

/// Quote a cell that contains the delimiter, doubling inner quotes.
pub fn escape_csv(cell: &str) -> String {
    if cell.contains(',') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
