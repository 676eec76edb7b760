//! Table rendering for CLI listings.

use unicode_width::UnicodeWidthStr;

pub struct Column {
    pub header: String,
    pub width: usize,
}

impl Column {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            width: header.width(),
        }
    }
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            columns: headers.iter().map(|h| Column::new(h)).collect(),
            rows: Vec::new(),
        }
    }

    /// Column widths grow to fit the widest cell.
    pub fn add_row(&mut self, row: Vec<String>) {
        for (col, cell) in self.columns.iter_mut().zip(&row) {
            col.width = col.width.max(cell.width());
        }
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        for col in &self.columns {
            push_padded(&mut out, &col.header, col.width);
        }
        out.push('\n');

        for col in &self.columns {
            out.push_str(&"-".repeat(col.width));
            out.push(' ');
        }
        out.push('\n');

        for row in &self.rows {
            for (i, col) in self.columns.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                push_padded(&mut out, cell, col.width);
            }
            out.push('\n');
        }

        out
    }
}

// format!("{:<w$}") pads by char count, which misaligns wide glyphs.
fn push_padded(out: &mut String, s: &str, width: usize) {
    out.push_str(s);
    out.push_str(&" ".repeat(width.saturating_sub(s.width()) + 1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_content() {
        let mut t = Table::new(&["ID", "Name"]);
        t.add_row(vec!["1".into(), "Laguna Seca".into()]);
        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID Name        ");
        assert_eq!(lines[2], "1  Laguna Seca ");
    }
}
