//! Minimal compound CSS selector matcher for the `css_selector_allowlist`.
//!
//! Supports `tag`, `.class`, `#id`, `[attr]`, `[attr=value]` and any
//! combination of those on a single element (`button.primary#buy[disabled]`).
//! Combinators are out of scope; unparseable selectors never match.

use autocapture_dom::DomNode;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Tag(String),
    Class(String),
    Id(String),
    Attr { name: String, value: Option<String> },
    Universal,
}

#[derive(Clone, Debug)]
pub struct Selector {
    parts: Vec<Part>,
}

impl Selector {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains(char::is_whitespace) || input.contains(['>', '~', '+'])
        {
            return None;
        }
        let mut parts = Vec::new();
        let mut chars = input.chars().peekable();
        while let Some(&c) = chars.peek() {
            match c {
                '.' => {
                    chars.next();
                    let name = take_ident(&mut chars)?;
                    parts.push(Part::Class(name));
                }
                '#' => {
                    chars.next();
                    let name = take_ident(&mut chars)?;
                    parts.push(Part::Id(name));
                }
                '[' => {
                    chars.next();
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(ch) => body.push(ch),
                            None => return None,
                        }
                    }
                    let part = match body.split_once('=') {
                        Some((name, value)) => Part::Attr {
                            name: name.trim().to_string(),
                            value: Some(value.trim().trim_matches(['"', '\'']).to_string()),
                        },
                        None => Part::Attr {
                            name: body.trim().to_string(),
                            value: None,
                        },
                    };
                    parts.push(part);
                }
                '*' => {
                    chars.next();
                    parts.push(Part::Universal);
                }
                _ => {
                    let name = take_ident(&mut chars)?;
                    parts.push(Part::Tag(name.to_ascii_lowercase()));
                }
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    pub fn matches(&self, el: &DomNode) -> bool {
        if !el.is_element() {
            return false;
        }
        self.parts.iter().all(|part| match part {
            Part::Universal => true,
            Part::Tag(tag) => el.is_tag(tag),
            Part::Class(class) => el.has_class(class),
            Part::Id(id) => el.attribute("id").as_deref() == Some(id.as_str()),
            Part::Attr { name, value } => match (el.attribute(name), value) {
                (Some(actual), Some(expected)) => &actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        })
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || matches!(c, '-' | '_') {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    (!out.is_empty()).then_some(out)
}
