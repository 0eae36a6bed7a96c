//! Selector Module
//!
//! CSS selector parsing and matching for target groups and source discovery.
//!
//! Supported grammar: selector lists (`a, b`), compound steps (`tag#id.class[attr]`),
//! the four combinators (descendant, `>`, `+`, `~`), attribute operators
//! (`=`, `^=`, `$=`, `*=`, `~=`, `|=`) and the pseudo classes `:checked`,
//! `:disabled`, `:enabled`, `:first-child`, `:last-child`, `:only-child` and `:not(...)`.
//! Anything else is rejected as an invalid selector rather than silently ignored.

use crate::error::BinderError;

/// Read-only view of an element, enough to evaluate a selector against it.
pub trait SelectorElement: Sized {
    /// Lowercase tag name
    fn local_name(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn parent_element(&self) -> Option<Self>;
    fn previous_element_sibling(&self) -> Option<Self>;
    fn next_element_sibling(&self) -> Option<Self>;

    /// Live checkedness for `:checked`. Options count as checked when selected.
    fn is_checked(&self) -> bool {
        if self.local_name() == "option" {
            return self.attribute("selected").is_some();
        }
        self.attribute("checked").is_some()
    }

    fn is_disabled(&self) -> bool {
        self.attribute("disabled").is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTOR AST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PseudoClass {
    Checked,
    Disabled,
    Enabled,
    FirstChild,
    LastChild,
    OnlyChild,
    Not(SelectorList),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundStep {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudo_classes: Vec<PseudoClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    step: CompoundStep,
    // Relation to the part on the left
    combinator: Option<Combinator>,
}

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    chains: Vec<Vec<SelectorPart>>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, BinderError> {
        let groups = split_groups(selector)?;
        let mut chains = Vec::with_capacity(groups.len());
        for group in groups {
            chains.push(parse_chain(selector, &group)?);
        }
        Ok(Self {
            source: selector.trim().to_string(),
            chains,
        })
    }

    pub fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        self.chains
            .iter()
            .any(|chain| matches_chain(element, chain))
    }
}

impl std::fmt::Display for SelectorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHING
// ═══════════════════════════════════════════════════════════════════════════════

fn matches_chain<E: SelectorElement>(element: &E, parts: &[SelectorPart]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_step(element, &last.step) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match last.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => element
            .parent_element()
            .map_or(false, |parent| matches_chain(&parent, rest)),
        Combinator::Descendant => {
            let mut cursor = element.parent_element();
            while let Some(ancestor) = cursor {
                if matches_chain(&ancestor, rest) {
                    return true;
                }
                cursor = ancestor.parent_element();
            }
            false
        }
        Combinator::AdjacentSibling => element
            .previous_element_sibling()
            .map_or(false, |sibling| matches_chain(&sibling, rest)),
        Combinator::GeneralSibling => {
            let mut cursor = element.previous_element_sibling();
            while let Some(sibling) = cursor {
                if matches_chain(&sibling, rest) {
                    return true;
                }
                cursor = sibling.previous_element_sibling();
            }
            false
        }
    }
}

fn matches_step<E: SelectorElement>(element: &E, step: &CompoundStep) -> bool {
    if let Some(tag) = &step.tag {
        if !element.local_name().eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if let Some(id) = &step.id {
        if element.attribute("id").as_deref() != Some(id.as_str()) {
            return false;
        }
    }

    if !step.classes.is_empty() {
        let class_attr = element.attribute("class").unwrap_or_default();
        if !step
            .classes
            .iter()
            .all(|class_name| class_attr.split_ascii_whitespace().any(|t| t == class_name.as_str()))
        {
            return false;
        }
    }

    for cond in &step.attrs {
        let matched = match cond {
            AttrCondition::Exists { key } => element.attribute(key).is_some(),
            AttrCondition::Eq { key, value } => {
                element.attribute(key).as_deref() == Some(value.as_str())
            }
            AttrCondition::StartsWith { key, value } => element
                .attribute(key)
                .map_or(false, |v| !value.is_empty() && v.starts_with(value.as_str())),
            AttrCondition::EndsWith { key, value } => element
                .attribute(key)
                .map_or(false, |v| !value.is_empty() && v.ends_with(value.as_str())),
            AttrCondition::Contains { key, value } => element
                .attribute(key)
                .map_or(false, |v| !value.is_empty() && v.contains(value.as_str())),
            AttrCondition::Includes { key, value } => element
                .attribute(key)
                .map_or(false, |v| v.split_ascii_whitespace().any(|t| t == value.as_str())),
            AttrCondition::DashMatch { key, value } => element.attribute(key).map_or(false, |v| {
                v == *value || v.starts_with(&format!("{}-", value))
            }),
        };
        if !matched {
            return false;
        }
    }

    step.pseudo_classes.iter().all(|pseudo| match pseudo {
        PseudoClass::Checked => element.is_checked(),
        PseudoClass::Disabled => element.is_disabled(),
        PseudoClass::Enabled => !element.is_disabled(),
        PseudoClass::FirstChild => element.previous_element_sibling().is_none(),
        PseudoClass::LastChild => element.next_element_sibling().is_none(),
        PseudoClass::OnlyChild => {
            element.previous_element_sibling().is_none()
                && element.next_element_sibling().is_none()
        }
        PseudoClass::Not(inner) => !inner.matches(element),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Split a selector list on top-level commas
fn split_groups(selector: &str) -> Result<Vec<String>, BinderError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(BinderError::invalid_selector(selector, "unbalanced ']'"));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                if paren_depth == 0 {
                    return Err(BinderError::invalid_selector(selector, "unbalanced ')'"));
                }
                paren_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 && paren_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(BinderError::invalid_selector(selector, "empty selector in list"));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || paren_depth != 0 || quote.is_some() {
        return Err(BinderError::invalid_selector(selector, "unterminated group"));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(BinderError::invalid_selector(selector, "empty selector"));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

/// Break one complex selector into compound steps and combinator tokens
fn tokenize(full: &str, selector: &str) -> Result<Vec<String>, BinderError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(ch);
            }
            '>' | '+' | '~' if bracket_depth == 0 && paren_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(ch.to_string());
            }
            c if c.is_whitespace() && bracket_depth == 0 && paren_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || paren_depth != 0 {
        return Err(BinderError::invalid_selector(full, "unterminated group"));
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    Ok(tokens)
}

fn parse_chain(full: &str, selector: &str) -> Result<Vec<SelectorPart>, BinderError> {
    let tokens = tokenize(full, selector)?;
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokens {
        let combinator = match token.as_str() {
            ">" => Some(Combinator::Child),
            "+" => Some(Combinator::AdjacentSibling),
            "~" => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending.is_some() || parts.is_empty() {
                return Err(BinderError::invalid_selector(full, "dangling combinator"));
            }
            pending = Some(combinator);
            continue;
        }

        let step = parse_step(full, &token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(BinderError::invalid_selector(full, "dangling combinator"));
    }
    Ok(parts)
}

fn parse_step(full: &str, part: &str) -> Result<CompoundStep, BinderError> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = CompoundStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if i != 0 {
                    return Err(BinderError::invalid_selector(full, "misplaced '*'"));
                }
                i += 1;
            }
            b'#' => {
                let Some((id, next)) = parse_ident(part, i + 1) else {
                    return Err(BinderError::invalid_selector(full, "expected id after '#'"));
                };
                if step.id.replace(id).is_some() {
                    return Err(BinderError::invalid_selector(full, "duplicate id"));
                }
                i = next;
            }
            b'.' => {
                let Some((class_name, next)) = parse_ident(part, i + 1) else {
                    return Err(BinderError::invalid_selector(full, "expected class after '.'"));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr_condition(full, part, i)?;
                step.attrs.push(cond);
                i = next;
            }
            b':' => {
                let (pseudo, next) = parse_pseudo(full, part, i)?;
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(BinderError::invalid_selector(
                        full,
                        format!("unexpected character in '{}'", part),
                    ));
                }
                let Some((tag, next)) = parse_ident(part, i) else {
                    return Err(BinderError::invalid_selector(
                        full,
                        format!("unexpected character in '{}'", part),
                    ));
                };
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    Ok(step)
}

fn parse_pseudo(full: &str, part: &str, start: usize) -> Result<(PseudoClass, usize), BinderError> {
    let Some((name, next)) = parse_ident(part, start + 1) else {
        return Err(BinderError::invalid_selector(full, "expected pseudo class name"));
    };
    let pseudo = match name.to_ascii_lowercase().as_str() {
        "checked" => PseudoClass::Checked,
        "disabled" => PseudoClass::Disabled,
        "enabled" => PseudoClass::Enabled,
        "first-child" => PseudoClass::FirstChild,
        "last-child" => PseudoClass::LastChild,
        "only-child" => PseudoClass::OnlyChild,
        "not" => {
            let rest = &part[next..];
            if !rest.starts_with('(') {
                return Err(BinderError::invalid_selector(full, ":not requires arguments"));
            }
            let Some(close) = find_matching_paren(rest) else {
                return Err(BinderError::invalid_selector(full, "unclosed :not("));
            };
            let inner = SelectorList::parse(&rest[1..close])
                .map_err(|_| BinderError::invalid_selector(full, "invalid :not() argument"))?;
            return Ok((PseudoClass::Not(inner), next + close + 1));
        }
        other => {
            return Err(BinderError::invalid_selector(
                full,
                format!("unsupported pseudo class ':{}'", other),
            ))
        }
    };
    Ok((pseudo, next))
}

fn find_matching_paren(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_ident_byte(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

// Non-ASCII bytes are accepted so class names like `.遅延` work.
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

fn is_attr_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':'
}

fn parse_attr_condition(
    full: &str,
    src: &str,
    open_bracket: usize,
) -> Result<(AttrCondition, usize), BinderError> {
    let bytes = src.as_bytes();
    let invalid = || BinderError::invalid_selector(full, "malformed attribute selector");
    let mut i = open_bracket + 1;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let key_start = i;
    while i < bytes.len() && is_attr_name_byte(bytes[i]) {
        i += 1;
    }
    if key_start == i {
        return Err(invalid());
    }
    let key = src[key_start..i].to_ascii_lowercase();

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    match bytes.get(i) {
        Some(b']') => return Ok((AttrCondition::Exists { key }, i + 1)),
        None => return Err(invalid()),
        _ => {}
    }

    let (op, after_op) = match (bytes[i], bytes.get(i + 1)) {
        (b'=', _) => ('=', i + 1),
        (b'^', Some(b'=')) => ('^', i + 2),
        (b'$', Some(b'=')) => ('$', i + 2),
        (b'*', Some(b'=')) => ('*', i + 2),
        (b'~', Some(b'=')) => ('~', i + 2),
        (b'|', Some(b'=')) => ('|', i + 2),
        _ => return Err(invalid()),
    };

    i = after_op;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let (value, after_value) = parse_attr_value(src, i).ok_or_else(invalid)?;
    i = after_value;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b']') {
        return Err(invalid());
    }

    let cond = match op {
        '=' => AttrCondition::Eq { key, value },
        '^' => AttrCondition::StartsWith { key, value },
        '$' => AttrCondition::EndsWith { key, value },
        '*' => AttrCondition::Contains { key, value },
        '~' => AttrCondition::Includes { key, value },
        _ => AttrCondition::DashMatch { key, value },
    };
    Ok((cond, i + 1))
}

fn parse_attr_value(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let first = *bytes.get(start)?;

    if first == b'"' || first == b'\'' {
        let mut i = start + 1;
        while i < bytes.len() {
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if bytes[i] == first {
                return Some((unescape(src.get(start + 1..i)?), i + 1));
            }
            i += 1;
        }
        return None;
    }

    let mut i = start;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b']' {
        if bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    let i = i.min(bytes.len());
    Some((unescape(src.get(start..i)?), i))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
