#![allow(dead_code)]

//! Conditional class-name composition with Tailwind conflict resolution.
//!
//! `cn` flattens a list of [`ClassValue`]s into whitespace-separated tokens and
//! then drops every utility class that a later class in the list overrides.
//! Two classes conflict when they belong to the same utility group under the
//! same variant modifiers (`hover:`, `md:`, ...) and importance (`!`).
//! Shorthand groups also override their side-specific forms, so `px-2 p-4`
//! collapses to `p-4` while `p-4 px-2` keeps both.

use std::collections::HashSet;

/// A single input to [`cn`].
#[derive(Debug, Clone)]
pub enum ClassValue<'a> {
    Class(&'a str),
    Owned(String),
    /// Included only when the flag is set.
    When(&'a str, bool),
    Maybe(Option<&'a str>),
    List(Vec<ClassValue<'a>>),
}

impl<'a> From<&'a str> for ClassValue<'a> {
    fn from(value: &'a str) -> Self {
        ClassValue::Class(value)
    }
}

impl From<String> for ClassValue<'_> {
    fn from(value: String) -> Self {
        ClassValue::Owned(value)
    }
}

impl<'a> From<Option<&'a str>> for ClassValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        ClassValue::Maybe(value)
    }
}

impl<'a> From<(&'a str, bool)> for ClassValue<'a> {
    fn from((class, enabled): (&'a str, bool)) -> Self {
        ClassValue::When(class, enabled)
    }
}

impl<'a> From<Vec<ClassValue<'a>>> for ClassValue<'a> {
    fn from(values: Vec<ClassValue<'a>>) -> Self {
        ClassValue::List(values)
    }
}

/// Merges conditional class names into one string, last conflicting utility wins.
pub fn cn<'a, I, V>(inputs: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Into<ClassValue<'a>>,
{
    let values: Vec<ClassValue<'a>> = inputs.into_iter().map(Into::into).collect();
    let mut tokens = Vec::new();
    for value in &values {
        collect_tokens(value, &mut tokens);
    }
    merge_classes(&tokens)
}

fn collect_tokens<'v>(value: &'v ClassValue<'_>, tokens: &mut Vec<&'v str>) {
    match value {
        ClassValue::Class(s) => tokens.extend(s.split_whitespace()),
        ClassValue::Owned(s) => tokens.extend(s.split_whitespace()),
        ClassValue::When(s, true) => tokens.extend(s.split_whitespace()),
        ClassValue::When(_, false) => {}
        ClassValue::Maybe(Some(s)) => tokens.extend(s.split_whitespace()),
        ClassValue::Maybe(None) => {}
        ClassValue::List(values) => {
            for v in values {
                collect_tokens(v, tokens);
            }
        }
    }
}

fn merge_classes(tokens: &[&str]) -> String {
    let mut claimed: HashSet<String> = HashSet::new();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());

    for &token in tokens.iter().rev() {
        let parsed = ParsedClass::parse(token);
        let Some(group) = class_group(parsed.base) else {
            kept.push(token);
            continue;
        };

        let scope = parsed.scope();
        if !claimed.insert(format!("{scope}{group}")) {
            continue;
        }
        for overridden in overridden_groups(group) {
            claimed.insert(format!("{scope}{overridden}"));
        }
        kept.push(token);
    }

    kept.reverse();
    kept.join(" ")
}

struct ParsedClass<'a> {
    modifiers: Vec<&'a str>,
    important: bool,
    base: &'a str,
}

impl<'a> ParsedClass<'a> {
    fn parse(token: &'a str) -> Self {
        let mut segments = split_modifiers(token);
        let last = segments.pop().unwrap_or(token);

        let (important, base) = match last.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => match last.strip_suffix('!') {
                Some(rest) => (true, rest),
                None => (false, last),
            },
        };
        let base = base.strip_prefix('-').unwrap_or(base);

        segments.sort_unstable();
        ParsedClass {
            modifiers: segments,
            important,
            base,
        }
    }

    /// Key prefix shared by classes that can override each other.
    fn scope(&self) -> String {
        let mut scope = self.modifiers.join(":");
        scope.push(':');
        if self.important {
            scope.push('!');
        }
        scope
    }
}

/// Splits `md:hover:bg-[url(a:b)]` on the colons that sit outside brackets.
fn split_modifiers(token: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in token.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ':' if depth == 0 => {
                segments.push(&token[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&token[start..]);
    segments
}

const DISPLAY: &[&str] = &[
    "block",
    "inline-block",
    "inline",
    "flex",
    "inline-flex",
    "grid",
    "inline-grid",
    "table",
    "contents",
    "flow-root",
    "list-item",
    "hidden",
];

const POSITION: &[&str] = &["static", "fixed", "absolute", "relative", "sticky"];

const FONT_SIZES: &[&str] = &[
    "xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl", "7xl", "8xl", "9xl",
];

const TEXT_ALIGN: &[&str] = &["left", "center", "right", "justify", "start", "end"];

const FONT_WEIGHTS: &[&str] = &[
    "thin",
    "extralight",
    "light",
    "normal",
    "medium",
    "semibold",
    "bold",
    "extrabold",
    "black",
];

const FONT_FAMILIES: &[&str] = &["sans", "serif", "mono"];

const BORDER_STYLES: &[&str] = &["solid", "dashed", "dotted", "double", "hidden", "none"];

const RADII: &[&str] = &["none", "sm", "md", "lg", "xl", "2xl", "3xl", "full"];

const SHADOWS: &[&str] = &["sm", "md", "lg", "xl", "2xl", "inner", "none"];

/// `(prefix, group)` for utilities of the form `<prefix>-<value>`.
/// Longer prefixes come first so `px-2` is not read as `p` with value `x-2`.
const PREFIXED: &[(&str, &str)] = &[
    ("min-w", "min-w"),
    ("max-w", "max-w"),
    ("min-h", "min-h"),
    ("max-h", "max-h"),
    ("gap-x", "gap-x"),
    ("gap-y", "gap-y"),
    ("gap", "gap"),
    ("px", "px"),
    ("py", "py"),
    ("pt", "pt"),
    ("pr", "pr"),
    ("pb", "pb"),
    ("pl", "pl"),
    ("p", "p"),
    ("mx", "mx"),
    ("my", "my"),
    ("mt", "mt"),
    ("mr", "mr"),
    ("mb", "mb"),
    ("ml", "ml"),
    ("m", "m"),
    ("size", "size"),
    ("w", "w"),
    ("h", "h"),
    ("inset", "inset"),
    ("top", "top"),
    ("right", "right"),
    ("bottom", "bottom"),
    ("left", "left"),
    ("z", "z"),
    ("opacity", "opacity"),
    ("justify-items", "justify-items"),
    ("justify-self", "justify-self"),
    ("justify", "justify-content"),
    ("items", "align-items"),
    ("cursor", "cursor"),
    ("overflow", "overflow"),
    ("leading", "leading"),
    ("tracking", "tracking"),
];

fn class_group(base: &str) -> Option<&'static str> {
    if DISPLAY.contains(&base) {
        return Some("display");
    }
    if POSITION.contains(&base) {
        return Some("position");
    }
    match base {
        "border" => return Some("border-w"),
        "rounded" => return Some("rounded"),
        "shadow" => return Some("shadow"),
        _ => {}
    }

    let (prefix, value) = base.split_once('-')?;
    match prefix {
        "text" => Some(text_group(value)),
        "font" => font_group(value),
        "bg" => Some(background_group(value)),
        "border" => border_group(value),
        "rounded" => RADII.contains(&value).then_some("rounded"),
        "shadow" => Some(if SHADOWS.contains(&value) {
            "shadow"
        } else {
            "shadow-color"
        }),
        "flex" => flex_group(value),
        _ => prefixed_group(base),
    }
}

fn prefixed_group(base: &str) -> Option<&'static str> {
    PREFIXED.iter().find_map(|&(prefix, group)| {
        base.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .filter(|value| !value.is_empty())
            .map(|_| group)
    })
}

fn text_group(value: &str) -> &'static str {
    if FONT_SIZES.contains(&value) || is_arbitrary_length(value) {
        "font-size"
    } else if TEXT_ALIGN.contains(&value) {
        "text-align"
    } else {
        "text-color"
    }
}

fn font_group(value: &str) -> Option<&'static str> {
    if FONT_WEIGHTS.contains(&value) {
        Some("font-weight")
    } else if FONT_FAMILIES.contains(&value) {
        Some("font-family")
    } else {
        None
    }
}

fn background_group(value: &str) -> &'static str {
    match value {
        "cover" | "contain" | "auto" => "bg-size",
        "fixed" | "local" | "scroll" => "bg-attachment",
        "center" | "top" | "bottom" | "left" | "right" | "left-top" | "left-bottom"
        | "right-top" | "right-bottom" => "bg-position",
        "repeat" | "no-repeat" | "repeat-x" | "repeat-y" | "repeat-round" | "repeat-space" => {
            "bg-repeat"
        }
        "none" => "bg-image",
        v if v.starts_with("gradient-") || v.starts_with("[url(") => "bg-image",
        _ => "bg-color",
    }
}

fn border_group(value: &str) -> Option<&'static str> {
    if BORDER_STYLES.contains(&value) {
        return Some("border-style");
    }
    if value.chars().all(|c| c.is_ascii_digit()) || is_arbitrary_length(value) {
        return Some("border-w");
    }
    // Side-specific borders (`border-t-2`, `border-x`) are left alone.
    let side = value.split('-').next().unwrap_or_default();
    if matches!(side, "x" | "y" | "t" | "r" | "b" | "l" | "s" | "e") {
        return None;
    }
    Some("border-color")
}

fn flex_group(value: &str) -> Option<&'static str> {
    match value {
        "row" | "row-reverse" | "col" | "col-reverse" => Some("flex-direction"),
        "wrap" | "wrap-reverse" | "nowrap" => Some("flex-wrap"),
        "1" | "auto" | "initial" | "none" => Some("flex"),
        _ => None,
    }
}

fn is_arbitrary_length(value: &str) -> bool {
    let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
        return false;
    };
    inner.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && ["px", "rem", "em", "%", "vh", "vw", "pt"]
            .iter()
            .any(|unit| inner.ends_with(unit))
}

/// Groups whose classes are overridden by a later class of `group`.
fn overridden_groups(group: &str) -> &'static [&'static str] {
    match group {
        "p" => &["px", "py", "pt", "pr", "pb", "pl"],
        "px" => &["pr", "pl"],
        "py" => &["pt", "pb"],
        "m" => &["mx", "my", "mt", "mr", "mb", "ml"],
        "mx" => &["mr", "ml"],
        "my" => &["mt", "mb"],
        "gap" => &["gap-x", "gap-y"],
        "inset" => &["top", "right", "bottom", "left"],
        "size" => &["w", "h"],
        _ => &[],
    }
}
