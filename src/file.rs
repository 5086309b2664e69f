// src/file.rs

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use crate::csv::write_row;

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

/// Ensure parent dir exists; create/truncate file; optionally write header.
pub fn write_rows_start<S: AsRef<str>>(path: &Path, headers: Option<&[S]>, sep: char) -> io::Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?; // truncate/overwrite
    let mut out = BufWriter::new(file);
    if let Some(h) = headers {
        write_row(&mut out, h, sep)?;
    }
    out.flush()
}

/// Append rows to an existing file (must be created already).
/// An unterminated last line is closed first.
pub fn append_rows<R: AsRef<[String]>>(path: &Path, rows: &[R], sep: char) -> io::Result<()> {
    let open_line = ends_mid_line(path)?;
    let file = OpenOptions::new().append(true).open(path)?;
    let mut out = BufWriter::new(file);
    if open_line {
        out.write_all(b"\n")?;
    }
    for row in rows {
        write_row(&mut out, row.as_ref(), sep)?;
    }
    out.flush()
}

/// True if the file has bytes and the last one is not `\n`.
fn ends_mid_line(path: &Path) -> io::Result<bool> {
    let mut f = File::open(path)?;
    if f.metadata()?.len() == 0 {
        return Ok(false);
    }
    f.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    f.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Header + rows, replacing any previous file.
pub fn write_table<S: AsRef<str>, R: AsRef<[String]>>(
    path: &Path,
    headers: &[S],
    rows: &[R],
    sep: char,
) -> io::Result<()> {
    write_rows_start(path, Some(headers), sep)?;
    append_rows(path, rows, sep)
}

/// True if the file is missing or has no bytes.
pub fn is_missing_or_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}
