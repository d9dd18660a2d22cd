use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// String literals, block comments and line comments, in one alternation so that a `//`
/// inside a string is not mistaken for a comment.
static NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"(?:[^"\\]|\\.)*"|/\*.*?\*/|//[^\n]*"#).expect("valid noise regex")
});

/// Innermost `[...]` group. Applied repeatedly to blank nested dimensions.
static DIMENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]*\]").expect("valid dimension regex"));

static MAKE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[^\n]*").expect("valid make comment regex"));

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_$]*").expect("valid identifier regex"));

pub(crate) static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bimport\s+([^;]+);").expect("valid import regex"));

pub(crate) static IMPORT_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*::\s*(?:\*|[A-Za-z_][A-Za-z0-9_]*)\s*$")
        .expect("valid import item regex")
});

pub(crate) static DIRECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(input|output|inout)\b").expect("valid direction regex"));

pub(crate) static NET_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(wire|reg|logic|bit|tri|wand|wor)\b").expect("valid net type regex")
});

pub(crate) static CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:module|interface|package|program)\s+(?:(?:automatic|static)\s+)?([A-Za-z_][A-Za-z0-9_$]*)",
    )
    .expect("valid container regex")
});

pub(crate) static MODULE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmodule\b").expect("valid module regex"));

pub(crate) static ENDMODULE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bendmodule\b").expect("valid endmodule regex"));

pub(crate) static MAKE_SIMULATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export[ \t]+|override[ \t]+)?SIM[ \t]*(?:\?=|:::=|::=|:=|\+=|=)[ \t]*(\S+)")
        .expect("valid simulator regex")
});

pub(crate) static MAKE_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_.\-]*)[ \t]*::?(?:[^=:]|$)").expect("valid target regex")
});

pub(crate) static MAKE_INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:-|s)?include[ \t]+(.+?)[ \t]*$").expect("valid include regex")
});

/// Tokens that introduce or qualify a declaration and are never the declared name.
const DECLARATION_KEYWORDS: &[&str] = &[
    "input", "output", "inout", "ref", "const", "var", "wire", "reg", "logic", "bit", "tri",
    "wand", "wor", "signed", "unsigned", "int", "integer", "byte", "shortint", "longint",
    "time", "real",
];

/// Source text with strings and comments blanked and dimensions removed.
pub(crate) fn normalize_source(text: &str) -> String {
    let without_noise = NOISE.replace_all(text, |caps: &Captures<'_>| {
        if caps[0].starts_with('"') {
            "\"\"".to_string()
        } else {
            " ".to_string()
        }
    });

    let mut current = without_noise.into_owned();
    while DIMENSION.is_match(&current) {
        current = DIMENSION.replace_all(&current, " ").into_owned();
    }
    current
}

pub(crate) fn strip_make_comments(text: &str) -> String {
    MAKE_COMMENT.replace_all(text, "").into_owned()
}

/// Names declared by the statement fragment `text[start..stop]`.
///
/// The fragment ends early at `;` or at a `)` that closes an enclosing port list. Items are
/// split on top-level commas; each contributes its last non-keyword identifier before any
/// `=` or `(`.
pub(crate) fn declared_names(text: &str, start: usize, stop: usize) -> Vec<String> {
    let segment = &text[start..stop];
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in segment.chars() {
        match ch {
            ';' => break,
            '(' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | '}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    items.push(current);

    items
        .iter()
        .filter_map(|item| trailing_identifier(item))
        .collect()
}

fn trailing_identifier(item: &str) -> Option<String> {
    let head = item
        .split(|c| c == '=' || c == '(')
        .next()
        .unwrap_or_default();
    IDENTIFIER
        .find_iter(head)
        .map(|m| m.as_str())
        .filter(|token| !DECLARATION_KEYWORDS.contains(token))
        .last()
        .map(str::to_string)
}
