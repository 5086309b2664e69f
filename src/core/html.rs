// src/core/html.rs
//! Tolerant, allocation-light HTML slicing. Not a parser: just enough to walk
//! tables, rows, cells, anchors and inputs on server-rendered pages.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
    }
    s!()
}

/// The opening tag of a block (`<a href=…>`), or the whole block if unterminated.
pub fn open_tag(block: &str) -> &str {
    match block.find('>') {
        Some(e) => &block[..=e],
        None => block,
    }
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => { in_tag = true; out.push(' '); }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// Visible text of a fragment: tags dropped, entities decoded, whitespace collapsed.
pub fn text_of(fragment: &str) -> String {
    use super::sanitize::{normalize_entities, normalize_ws};
    normalize_ws(&normalize_entities(&strip_tags(fragment)))
}

fn name_ends(lc: &[u8], at: usize) -> bool {
    matches!(lc.get(at), None | Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/'))
}

fn opens_at(lc: &str, at: usize, name: &str) -> bool {
    let b = lc.as_bytes();
    b.get(at) == Some(&b'<')
        && lc.get(at + 1..at + 1 + name.len()) == Some(name)
        && name_ends(b, at + 1 + name.len())
}

fn closes_at(lc: &str, at: usize, name: &str) -> bool {
    let b = lc.as_bytes();
    lc.get(at..at + 2) == Some("</")
        && lc.get(at + 2..at + 2 + name.len()) == Some(name)
        && name_ends(b, at + 2 + name.len())
}

/// Outermost `<name …>…</name>` elements of `s`, for any of `names`.
///
/// Same-named elements nest (a table inside a cell stays inside that cell).
/// An element left open at the end of input runs to the end.
pub fn elements_ci<'a>(s: &'a str, names: &[&str]) -> Vec<&'a str> {
    let lc = to_lower(s);
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while let Some(rel) = lc.get(i..).and_then(|t| t.find('<')) {
        let at = i + rel;
        if names.iter().any(|n| opens_at(&lc, at, n)) {
            if depth == 0 {
                start = at;
            }
            depth += 1;
            i = at + 1;
        } else if depth > 0 && names.iter().any(|n| closes_at(&lc, at, n)) {
            let end = lc[at..].find('>').map_or(lc.len(), |e| at + e + 1);
            depth -= 1;
            if depth == 0 {
                out.push(&s[start..end]);
            }
            i = end;
        } else {
            i = at + 1;
        }
    }
    if depth > 0 {
        out.push(&s[start..]);
    }
    out
}

/// Every `<name …>` opening tag in `s`, nested or not (for void elements like `<input>`).
pub fn open_tags_ci<'a>(s: &'a str, name: &str) -> Vec<&'a str> {
    let lc = to_lower(s);
    let mut out = Vec::new();
    let mut i = 0usize;
    while let Some(rel) = lc.get(i..).and_then(|t| t.find('<')) {
        let at = i + rel;
        if opens_at(&lc, at, name) {
            let end = lc[at..].find('>').map_or(lc.len(), |e| at + e + 1);
            out.push(&s[at..end]);
            i = end;
        } else {
            i = at + 1;
        }
    }
    out
}

/// Attribute value from an opening tag. Quoted or bare; name matched case-insensitively.
pub fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let lc = to_lower(tag);
    let needle = to_lower(attr);
    let mut from = 0usize;
    while let Some(rel) = lc.get(from..)?.find(&needle) {
        let at = from + rel;
        from = at + needle.len();
        let before_ok = at > 0 && lc.as_bytes()[at - 1].is_ascii_whitespace();
        let rest = lc[from..].trim_start();
        if !before_ok || !rest.starts_with('=') {
            continue;
        }
        let val_start = tag.len() - rest.len() + 1;
        let val = tag[val_start..].trim_start();
        let v = match val.chars().next() {
            Some(q @ ('"' | '\'')) => val[1..].split(q).next().unwrap_or(""),
            _ => val
                .split(|c: char| c.is_ascii_whitespace() || c == '>')
                .next()
                .unwrap_or(""),
        };
        return Some(super::sanitize::normalize_entities(v));
    }
    None
}
