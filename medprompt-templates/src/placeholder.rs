//! Placeholder syntax: `{name}` variables with `{{`/`}}` escapes
//!
//! Template text is a sequence of literal runs and named placeholders.
//! Doubled braces are literal single braces in the output; a lone brace
//! that opens no placeholder is a parse error. Placeholder names use the
//! same character set as canonical property keys.

use crate::error::{Result, TemplateError};

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#')
}

#[derive(Debug, PartialEq)]
enum Segment {
    Text(String),
    Var(String),
}

fn segments(text: &str) -> Result<Vec<Segment>> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '{' => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j]) {
                    j += 1;
                }
                if j == i + 1 || chars.get(j) != Some(&'}') {
                    return Err(TemplateError::Parse {
                        message: format!("malformed placeholder at offset {i}"),
                    });
                }
                if !literal.is_empty() {
                    out.push(Segment::Text(std::mem::take(&mut literal)));
                }
                out.push(Segment::Var(chars[i + 1..j].iter().collect()));
                i = j + 1;
            }
            '}' => {
                return Err(TemplateError::Parse {
                    message: format!("stray '}}' at offset {i}"),
                })
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        out.push(Segment::Text(literal));
    }
    Ok(out)
}

/// The placeholder names a template demands, first-appearance order,
/// deduplicated.
pub fn placeholders(text: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for segment in segments(text)? {
        if let Segment::Var(name) = segment {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Substitute every placeholder using the given resolver, unescaping
/// doubled braces. A placeholder the resolver cannot supply is an error.
pub fn render<F>(text: &str, resolve: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    for segment in segments(text)? {
        match segment {
            Segment::Text(literal) => out.push_str(&literal),
            Segment::Var(name) => match resolve(&name) {
                Some(value) => out.push_str(&value),
                None => return Err(TemplateError::UnresolvedPlaceholder { name }),
            },
        }
    }
    Ok(out)
}

/// Double every brace that is not part of a well-formed placeholder, so
/// uploaded body text renders its braces literally while keeping `{name}`
/// substitutable.
pub fn escape_stray_braces(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                out.push_str("{{");
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                out.push_str("}}");
                i += 2;
            }
            '{' => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j]) {
                    j += 1;
                }
                if j > i + 1 && chars.get(j) == Some(&'}') {
                    out.extend(&chars[i..=j]);
                    i = j + 1;
                } else {
                    out.push_str("{{");
                    i += 1;
                }
            }
            '}' => {
                out.push_str("}}");
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_placeholders_in_order() {
        let names = placeholders("Dear {name}, you are {age} years old, {name}.").unwrap();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn escaped_braces_are_not_placeholders() {
        let names = placeholders("a {{literal}} and {real}").unwrap();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn empty_placeholder_is_an_error() {
        assert!(matches!(
            placeholders("oops {}"),
            Err(TemplateError::Parse { .. })
        ));
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        assert!(placeholders("hello {name").is_err());
        assert!(placeholders("hello {na me}").is_err());
    }

    #[test]
    fn stray_closing_brace_is_an_error() {
        assert!(placeholders("oops } here").is_err());
    }

    #[test]
    fn render_substitutes_and_unescapes() {
        let result = render("{{x}} = {value}", |name| {
            (name == "value").then(|| "42".to_string())
        })
        .unwrap();
        assert_eq!(result, "{x} = 42");
    }

    #[test]
    fn render_fails_on_unresolved() {
        let err = render("hello {name}", |_| None).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnresolvedPlaceholder { name } if name == "name"
        ));
    }

    #[test]
    fn escape_keeps_valid_placeholders() {
        assert_eq!(escape_stray_braces("Hello {name}"), "Hello {name}");
    }

    #[test]
    fn escape_doubles_stray_braces() {
        assert_eq!(escape_stray_braces("set {x := 1}"), "set {{x := 1}}");
        assert_eq!(escape_stray_braces("closing } alone"), "closing }} alone");
        assert_eq!(escape_stray_braces("open { alone"), "open {{ alone");
    }

    #[test]
    fn escape_leaves_doubled_braces_alone() {
        assert_eq!(escape_stray_braces("a {{b}} c"), "a {{b}} c");
    }
}
