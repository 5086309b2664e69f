// src/core/sanitize.rs

/// Decode the entities the helpdesk emits: common named ones plus `&#NNN;` / `&#xHH;`.
/// Unknown entities are left as they are.
pub fn normalize_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    let c = match name {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "laquo" => '«',
        "raquo" => '»',
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            return char::from_u32(code).map(|c| if c == '\u{a0}' { ' ' } else { c });
        }
    };
    Some(c)
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Collapse all whitespace away (`"[ >> ]"` → `"[>>]"`).
pub fn squash_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities() {
        assert_eq!(normalize_entities("a&nbsp;&amp;&nbsp;b"), "a & b");
        assert_eq!(normalize_entities("&raquo;&#187; &#x3E;&#62;"), "»» >>");
        assert_eq!(normalize_entities("R&D &bogus; &"), "R&D &bogus; &");
    }

    #[test]
    fn whitespace() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
        assert_eq!(squash_ws("[ >> ]"), "[>>]");
    }
}
