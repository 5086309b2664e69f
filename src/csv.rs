// src/csv.rs
use std::io::{self, Write};
use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant). Blank lines are skipped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        let cell = cell.as_ref();
        if !first { write!(w, "{}", sep)?; } else { first = false; }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_crlf() {
        let rows = parse_rows("a,\"b,c\",\"say \"\"hi\"\"\"\r\n\r\nx,y,z", ',');
        assert_eq!(rows, vec![
            vec![s!("a"), s!("b,c"), s!("say \"hi\"")],
            vec![s!("x"), s!("y"), s!("z")],
        ]);
    }

    #[test]
    fn writer_quotes_only_when_needed() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["DS123", "crash, again", "Acme"], ',').unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "DS123,\"crash, again\",Acme\n");
    }

    #[test]
    fn written_rows_read_back() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["18/08/2025", "Agency \"A\"", "3"], ',').unwrap();
        write_row(&mut buf, &["19/08/2025", "B", "0"], ',').unwrap();
        let rows = parse_rows(std::str::from_utf8(&buf).unwrap(), ',');
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "Agency \"A\"");
    }
}
