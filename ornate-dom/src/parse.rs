use crate::node::DomNode;
use crate::{is_raw_text, is_void};

/// Tags that implicitly close an open sibling of the same tag.
const SELF_NESTING_CLOSERS: &[&str] = &["li", "option", "p", "tr", "td", "th", "dt", "dd"];

/// Best-effort HTML fragment parser.
///
/// Handles nested elements, void and self-closing tags, comments, raw-text
/// elements (`script`, `style`, `textarea`, `title`), quoted, unquoted and
/// valueless attributes, and character references. Tag and attribute names
/// are lower-cased. Stray closing tags are ignored and unclosed elements are
/// closed at the end of input; malformed input never fails.
pub fn parse_fragment(input: &str) -> Vec<DomNode> {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut stack: Vec<DomNode> = Vec::new();
    let mut roots: Vec<DomNode> = Vec::new();

    fn push_child(stack: &[DomNode], roots: &mut Vec<DomNode>, node: &DomNode) {
        match stack.last() {
            Some(parent) => parent.append_child(node),
            None => roots.push(node.clone()),
        }
    }

    while i < bytes.len() {
        if bytes[i] != b'<' || !starts_markup(bytes, i) {
            let start = i;
            i += 1;
            while i < bytes.len() && !(bytes[i] == b'<' && starts_markup(bytes, i)) {
                i += 1;
            }
            let text = decode_entities(&input[start..i]);
            push_child(&stack, &mut roots, &DomNode::text(&text));
            continue;
        }

        // comment
        if input[i..].starts_with("<!--") {
            let body_start = i + 4;
            let (body_end, next) = match input[body_start..].find("-->") {
                Some(off) => (body_start + off, body_start + off + 3),
                None => (bytes.len(), bytes.len()),
            };
            push_child(&stack, &mut roots, &DomNode::comment(&input[body_start..body_end]));
            i = next;
            continue;
        }

        // doctype and processing instructions are skipped
        if bytes[i + 1] == b'!' || bytes[i + 1] == b'?' {
            i = input[i..].find('>').map_or(bytes.len(), |off| i + off + 1);
            continue;
        }

        // closing tag
        if bytes[i + 1] == b'/' {
            i += 2;
            let tag = read_name(input, &mut i).to_ascii_lowercase();
            i = input[i..].find('>').map_or(bytes.len(), |off| i + off + 1);
            if let Some(pos) = stack.iter().rposition(|n| n.is_tag(&tag)) {
                stack.truncate(pos);
            }
            continue;
        }

        // opening tag
        i += 1;
        let tag = read_name(input, &mut i).to_ascii_lowercase();
        let el = DomNode::element(&tag);
        let mut self_closing = false;

        loop {
            skip_ws(bytes, &mut i);
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'/' => {
                    i += 1;
                    skip_ws(bytes, &mut i);
                    if i < bytes.len() && bytes[i] == b'>' {
                        self_closing = true;
                        i += 1;
                        break;
                    }
                }
                b'>' => {
                    i += 1;
                    break;
                }
                _ => match read_attribute(input, &mut i) {
                    Some((name, value)) => {
                        if !el.has_attribute(&name) {
                            el.set_attribute(&name, &value);
                        }
                    }
                    None => i += 1,
                },
            }
        }

        if SELF_NESTING_CLOSERS.contains(&tag.as_str())
            && stack.last().is_some_and(|top| top.is_tag(&tag))
        {
            stack.pop();
        }
        push_child(&stack, &mut roots, &el);

        if is_raw_text(&tag) && !self_closing {
            let close = format!("</{tag}");
            let rest = &input[i..];
            let end = find_ascii_ci(rest, &close).unwrap_or(rest.len());
            let raw = &rest[..end];
            if !raw.is_empty() {
                let content = if tag == "textarea" || tag == "title" {
                    decode_entities(raw)
                } else {
                    raw.to_string()
                };
                el.append_child(&DomNode::text(&content));
            }
            i += end;
            i = input[i..].find('>').map_or(bytes.len(), |off| i + off + 1);
            continue;
        }

        if !self_closing && !is_void(&tag) {
            stack.push(el);
        }
    }

    roots
}

/// `<` begins markup only when followed by a name, `/`, `!` or `?`.
fn starts_markup(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i + 1)
        .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_name<'a>(input: &'a str, i: &mut usize) -> &'a str {
    let bytes = input.as_bytes();
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c == b':' || c == b'.' {
            *i += 1;
        } else {
            break;
        }
    }
    &input[start..*i]
}

fn read_attribute(input: &str, i: &mut usize) -> Option<(String, String)> {
    let bytes = input.as_bytes();
    let name_start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || matches!(c, b'=' | b'>' | b'/' | b'"' | b'\'') {
            break;
        }
        *i += 1;
    }
    if *i == name_start {
        return None;
    }
    let name = input[name_start..*i].to_ascii_lowercase();

    skip_ws(bytes, i);
    if *i >= bytes.len() || bytes[*i] != b'=' {
        return Some((name, String::new()));
    }
    *i += 1;
    skip_ws(bytes, i);

    let value = match bytes.get(*i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            *i += 1;
            let start = *i;
            while *i < bytes.len() && bytes[*i] != quote {
                *i += 1;
            }
            let raw = &input[start..*i];
            if *i < bytes.len() {
                *i += 1;
            }
            raw
        }
        _ => {
            let start = *i;
            while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
                *i += 1;
            }
            &input[start..*i]
        }
    };
    Some((name, decode_entities(value)))
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let (h, n) = (haystack.as_bytes(), needle.as_bytes());
    if n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&at| h[at..at + n.len()].eq_ignore_ascii_case(n))
}

/// Decodes the common named references and numeric references.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            c.map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
