//! Line parser: one raw text line in, one typed outcome out.
//!
//! Every line becomes exactly one of three things: silently excluded
//! (matched a configured exclude pattern), a [`ParsedRule`], or a
//! [`RejectedLine`] with a specific reason. Malformed input never panics
//! and never aborts the surrounding run.

use anyhow::{Context, Result};
use regex::Regex;

use crate::dialect::SyntaxDictionary;
use crate::rule::{Modifier, ParsedRule, RawLine, RejectReason, RejectedLine, RuleKind};

/// Cosmetic-family separators, most specific first so `#@#` is not
/// mistaken for `##`.
const COSMETIC_SEPARATORS: &[(&str, bool)] = &[("#@#", true), ("#?#", false), ("##", false)];

/// Outcome of parsing one raw line.
#[derive(Debug, Clone)]
pub enum LineOutcome {
    /// Matched an exclude pattern; skipped without a trace beyond a counter.
    Excluded,
    Parsed(ParsedRule),
    Rejected(RejectedLine),
}

/// Compiled exclude patterns applied before structural parsing.
///
/// Patterns are anchored at the start of the line, matching the semantics
/// the configuration format has always had.
pub struct ExcludeSet {
    patterns: Vec<Regex>,
}

impl ExcludeSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{})", p))
                    .with_context(|| format!("Invalid exclude pattern: {}", p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns: compiled })
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }
}

/// Parse a single raw line into a typed outcome.
pub fn parse(raw: &RawLine, dict: &SyntaxDictionary, excludes: &ExcludeSet) -> LineOutcome {
    let trimmed = raw.text.trim();

    if excludes.matches(trimmed) {
        return LineOutcome::Excluded;
    }

    if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with("[Adblock") {
        return reject(raw, RejectReason::EmptyOrComment);
    }
    // Hash comments from hosts-style lists (a lone `#` never starts a rule)
    if trimmed.starts_with('#') && !starts_with_cosmetic_separator(trimmed) {
        return reject(raw, RejectReason::EmptyOrComment);
    }

    // Dialect-specific rewrites happen before structural parsing so the
    // rest of the parser only ever sees canonical uBO-shaped syntax.
    let line = match dict.rewrite_line(trimmed, raw.source.dialect) {
        Ok(line) => line,
        Err(reason) => return reject(raw, reason),
    };

    match parse_canonical(&line, raw, dict) {
        Ok(rule) => LineOutcome::Parsed(rule),
        Err(reason) => reject(raw, reason),
    }
}

fn reject(raw: &RawLine, reason: RejectReason) -> LineOutcome {
    LineOutcome::Rejected(RejectedLine {
        raw: raw.clone(),
        reason,
    })
}

fn starts_with_cosmetic_separator(line: &str) -> bool {
    COSMETIC_SEPARATORS.iter().any(|(sep, _)| line.starts_with(sep))
}

/// Parse a line already in canonical uBO syntax.
fn parse_canonical(
    line: &str,
    raw: &RawLine,
    dict: &SyntaxDictionary,
) -> Result<ParsedRule, RejectReason> {
    for (sep, is_exception) in COSMETIC_SEPARATORS {
        if let Some(pos) = line.find(sep) {
            return parse_cosmetic_family(line, pos, sep, *is_exception, raw, dict);
        }
    }
    parse_network(line, raw, dict)
}

/// `domains##selector`, `domains#@#selector`, `domains##+js(...)`,
/// `domains##^tag-filter`.
fn parse_cosmetic_family(
    line: &str,
    sep_pos: usize,
    sep: &str,
    is_exception: bool,
    raw: &RawLine,
    dict: &SyntaxDictionary,
) -> Result<ParsedRule, RejectReason> {
    let domains_part = &line[..sep_pos];
    let selector = &line[sep_pos + sep.len()..];

    if selector.trim().is_empty() {
        return Err(RejectReason::AmbiguousPatternSyntax);
    }

    let domains_applied = parse_domain_list(domains_part, ',')?;

    let (kind, pattern) = if let Some(payload) = selector.strip_prefix("+js(") {
        let payload = payload
            .strip_suffix(')')
            .ok_or(RejectReason::AmbiguousPatternSyntax)?;
        (RuleKind::Scriptlet, canonical_scriptlet_payload(payload, dict))
    } else if selector.starts_with('^') {
        if !brackets_balanced(selector) {
            return Err(RejectReason::AmbiguousPatternSyntax);
        }
        (RuleKind::HtmlFilter, selector.to_string())
    } else {
        if !brackets_balanced(selector) {
            return Err(RejectReason::AmbiguousPatternSyntax);
        }
        (RuleKind::Cosmetic, selector.trim().to_string())
    };

    Ok(ParsedRule {
        kind,
        pattern,
        modifiers: Vec::new(),
        is_exception,
        domains_applied,
        origin: raw.source.clone(),
        raw_text: raw.text.trim().to_string(),
    })
}

/// Rebuild a scriptlet payload with the scriptlet name in canonical form.
/// Arguments beyond the name are opaque and preserved verbatim.
fn canonical_scriptlet_payload(payload: &str, dict: &SyntaxDictionary) -> String {
    match payload.split_once(',') {
        Some((name, rest)) => format!(
            "+js({}, {})",
            dict.canonical_scriptlet(name.trim()),
            rest.trim()
        ),
        None => format!("+js({})", dict.canonical_scriptlet(payload.trim())),
    }
}

/// Network filter: optional `@@` exception marker, pattern, optional
/// `$`-delimited modifier tail.
fn parse_network(
    line: &str,
    raw: &RawLine,
    dict: &SyntaxDictionary,
) -> Result<ParsedRule, RejectReason> {
    let (is_exception, rest) = match line.strip_prefix("@@") {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    if rest.is_empty() {
        return Err(RejectReason::AmbiguousPatternSyntax);
    }

    let (pattern, tail) = split_modifier_tail(rest);

    if pattern.is_empty() || pattern.chars().any(char::is_whitespace) {
        return Err(RejectReason::AmbiguousPatternSyntax);
    }

    let mut modifiers = Vec::new();
    let mut domains_applied = Vec::new();
    let mut seen_names: Vec<String> = Vec::new();

    if let Some(tail) = tail {
        for part in split_unescaped(tail, ',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(RejectReason::MalformedModifierList);
            }

            let (raw_name, value) = match part.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (part, None),
            };

            let (negated, bare_name) = match raw_name.strip_prefix('~') {
                Some(n) => (true, n),
                None => (false, raw_name),
            };
            if bare_name.is_empty() || !is_well_formed_modifier_name(bare_name) {
                return Err(RejectReason::MalformedModifierList);
            }

            let canonical = dict.canonical_modifier(bare_name);
            let name = if negated {
                format!("~{}", canonical)
            } else {
                canonical.to_string()
            };

            // Duplicate names are ambiguous authoring intent: flagged, not guessed
            if seen_names.iter().any(|n| n == &name) {
                return Err(RejectReason::MalformedModifierList);
            }
            seen_names.push(name.clone());

            if name == "domain" {
                let value = value.ok_or(RejectReason::MalformedModifierList)?;
                domains_applied = parse_domain_list(&value, '|')?;
                if domains_applied.is_empty() {
                    return Err(RejectReason::MalformedModifierList);
                }
                continue;
            }

            let value = match (name.as_str(), value) {
                ("redirect" | "redirect-rule", Some(v)) => {
                    Some(dict.canonical_redirect(&v).to_string())
                }
                (_, v) => v,
            };

            modifiers.push(Modifier { name, value });
        }
    }

    Ok(ParsedRule {
        kind: RuleKind::Network,
        pattern: pattern.to_string(),
        modifiers,
        is_exception,
        domains_applied,
        origin: raw.source.clone(),
        raw_text: raw.text.trim().to_string(),
    })
}

/// Split a network rule into pattern and optional modifier tail.
///
/// The tail starts at the last unescaped `$` whose suffix looks like an
/// option list; a `$` inside a regex atom or a value therefore stays with
/// the pattern.
fn split_modifier_tail(rest: &str) -> (&str, Option<&str>) {
    // A pure regex atom carries no tail
    if rest.len() > 1 && rest.starts_with('/') && rest.ends_with('/') {
        return (rest, None);
    }

    let bytes = rest.as_bytes();
    for i in (1..bytes.len()).rev() {
        if bytes[i] == b'$' && bytes[i - 1] != b'\\' {
            let tail = &rest[i + 1..];
            if tail
                .chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric() || c == '~' || c == '_')
                .unwrap_or(false)
            {
                return (&rest[..i], Some(tail));
            }
        }
    }
    (rest, None)
}

/// Split on a separator character, honoring backslash escapes.
fn split_unescaped(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_escape = false;
    for (i, c) in text.char_indices() {
        if c == sep && !prev_escape {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
        prev_escape = c == '\\' && !prev_escape;
    }
    parts.push(&text[start..]);
    parts
}

/// Parse a domain scope list (`a.com,~b.com` or `a.com|~b.com`).
fn parse_domain_list(text: &str, sep: char) -> Result<Vec<String>, RejectReason> {
    let mut domains = Vec::new();
    for entry in text.split(sep) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let host = entry.strip_prefix('~').unwrap_or(entry);
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(RejectReason::AmbiguousPatternSyntax);
        }
        domains.push(entry.to_string());
    }
    Ok(domains)
}

fn is_well_formed_modifier_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Structural well-formedness only: brackets and parens must balance and
/// never go negative. No attempt at full CSS validation.
fn brackets_balanced(selector: &str) -> bool {
    let mut paren = 0i32;
    let mut square = 0i32;
    let mut brace = 0i32;
    for c in selector.chars() {
        match c {
            '(' => paren += 1,
            ')' => paren -= 1,
            '[' => square += 1,
            ']' => square -= 1,
            '{' => brace += 1,
            '}' => brace -= 1,
            _ => {}
        }
        if paren < 0 || square < 0 || brace < 0 {
            return false;
        }
    }
    paren == 0 && square == 0 && brace == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::rule::SourceDescriptor;

    fn raw(text: &str) -> RawLine {
        raw_with_dialect(text, Dialect::Ublock)
    }

    fn raw_with_dialect(text: &str, dialect: Dialect) -> RawLine {
        RawLine {
            text: text.to_string(),
            source: SourceDescriptor {
                name: "test".to_string(),
                dialect,
                priority: 1,
                enabled: true,
            },
            line_number: 1,
        }
    }

    fn parse_ok(text: &str) -> ParsedRule {
        match parse(&raw(text), &SyntaxDictionary::new(), &ExcludeSet::empty()) {
            LineOutcome::Parsed(rule) => rule,
            other => panic!("expected parsed rule for {:?}, got {:?}", text, other),
        }
    }

    fn parse_reject(text: &str) -> RejectReason {
        match parse(&raw(text), &SyntaxDictionary::new(), &ExcludeSet::empty()) {
            LineOutcome::Rejected(rejected) => rejected.reason,
            other => panic!("expected reject for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn test_parse_basic_network() {
        let rule = parse_ok("||example.com^");
        assert_eq!(rule.kind, RuleKind::Network);
        assert_eq!(rule.pattern, "||example.com^");
        assert!(!rule.is_exception);
        assert!(rule.modifiers.is_empty());
    }

    #[test]
    fn test_parse_network_exception() {
        let rule = parse_ok("@@||example.com^");
        assert!(rule.is_exception);
        assert_eq!(rule.pattern, "||example.com^");
    }

    #[test]
    fn test_parse_modifier_tail() {
        let rule = parse_ok("||ads.example^$script,3p");
        assert_eq!(rule.modifiers.len(), 2);
        assert_eq!(rule.modifiers[0].name, "script");
        assert_eq!(rule.modifiers[1].name, "3p");
    }

    #[test]
    fn test_parse_modifier_aliases() {
        let rule = parse_ok("||ads.example^$third-party,xmlhttprequest");
        assert_eq!(rule.modifiers[0].name, "3p");
        assert_eq!(rule.modifiers[1].name, "xhr");
    }

    #[test]
    fn test_parse_negated_modifier() {
        let rule = parse_ok("||ads.example^$~third-party");
        assert_eq!(rule.modifiers[0].name, "~3p");
    }

    #[test]
    fn test_parse_domain_scope() {
        let rule = parse_ok("||track.example^$domain=a.com|~b.com");
        assert_eq!(rule.domains_applied, vec!["a.com", "~b.com"]);
        // domain never appears as an ordinary modifier
        assert!(rule.modifiers.iter().all(|m| m.name != "domain"));
    }

    #[test]
    fn test_parse_duplicate_modifier_rejected() {
        assert_eq!(
            parse_reject("||ads.example^$script,script"),
            RejectReason::MalformedModifierList
        );
        // Aliases collide with their canonical form
        assert_eq!(
            parse_reject("||ads.example^$3p,third-party"),
            RejectReason::MalformedModifierList
        );
    }

    #[test]
    fn test_parse_empty_modifier_rejected() {
        assert_eq!(
            parse_reject("||ads.example^$script,,image"),
            RejectReason::MalformedModifierList
        );
    }

    #[test]
    fn test_parse_unknown_modifier_preserved() {
        let rule = parse_ok("||ads.example^$some-future-option=value");
        assert_eq!(rule.modifiers[0].name, "some-future-option");
        assert_eq!(rule.modifiers[0].value.as_deref(), Some("value"));
    }

    #[test]
    fn test_parse_escaped_comma_in_value() {
        let rule = parse_ok(r"||ads.example^$removeparam=/^(utm|fb)\,/");
        assert_eq!(rule.modifiers.len(), 1);
        assert_eq!(
            rule.modifiers[0].value.as_deref(),
            Some(r"/^(utm|fb)\,/")
        );
    }

    #[test]
    fn test_parse_redirect_resource_alias() {
        let rule = parse_ok("||ads.example^$redirect=noopjs");
        assert_eq!(rule.modifiers[0].value.as_deref(), Some("noop.js"));
    }

    #[test]
    fn test_parse_regex_atom_keeps_dollar() {
        let rule = parse_ok("/ads/[0-9]{3}x[0-9]{3}/");
        assert_eq!(rule.pattern, "/ads/[0-9]{3}x[0-9]{3}/");
        assert!(rule.modifiers.is_empty());
    }

    #[test]
    fn test_parse_cosmetic() {
        let rule = parse_ok("example.com##.ad-class");
        assert_eq!(rule.kind, RuleKind::Cosmetic);
        assert_eq!(rule.pattern, ".ad-class");
        assert_eq!(rule.domains_applied, vec!["example.com"]);
    }

    #[test]
    fn test_parse_cosmetic_global() {
        let rule = parse_ok("##.ad-class");
        assert!(rule.domains_applied.is_empty());
    }

    #[test]
    fn test_parse_cosmetic_exception() {
        let rule = parse_ok("example.com#@#.ad-class");
        assert!(rule.is_exception);
        assert_eq!(rule.kind, RuleKind::Cosmetic);
    }

    #[test]
    fn test_parse_procedural_separator() {
        let rule = parse_ok("example.com#?#.ad:has(.banner)");
        assert_eq!(rule.kind, RuleKind::Cosmetic);
        assert_eq!(rule.pattern, ".ad:has(.banner)");
    }

    #[test]
    fn test_parse_scriptlet() {
        let rule = parse_ok("example.com##+js(aopr, adBlockDetected)");
        assert_eq!(rule.kind, RuleKind::Scriptlet);
        assert_eq!(rule.pattern, "+js(aopr, adBlockDetected)");
    }

    #[test]
    fn test_parse_scriptlet_name_alias() {
        let rule = parse_ok("example.com##+js(abort-on-property-read, adBlockDetected)");
        assert_eq!(rule.pattern, "+js(aopr, adBlockDetected)");
    }

    #[test]
    fn test_parse_scriptlet_unterminated_rejected() {
        assert_eq!(
            parse_reject("example.com##+js(aopr, detector"),
            RejectReason::AmbiguousPatternSyntax
        );
    }

    #[test]
    fn test_parse_html_filter() {
        let rule = parse_ok("example.com##^script:has-text(ads)");
        assert_eq!(rule.kind, RuleKind::HtmlFilter);
        assert_eq!(rule.pattern, "^script:has-text(ads)");
    }

    #[test]
    fn test_parse_malformed_selector_rejected() {
        assert_eq!(
            parse_reject("##[invalid((("),
            RejectReason::AmbiguousPatternSyntax
        );
    }

    #[test]
    fn test_parse_comment_rejected_as_empty() {
        assert_eq!(parse_reject("! a comment"), RejectReason::EmptyOrComment);
        assert_eq!(parse_reject(""), RejectReason::EmptyOrComment);
        assert_eq!(
            parse_reject("[Adblock Plus 2.0]"),
            RejectReason::EmptyOrComment
        );
    }

    #[test]
    fn test_exclude_patterns_silent() {
        let excludes = ExcludeSet::compile(&["!".to_string(), r"\[Adblock".to_string()]).unwrap();
        let outcome = parse(&raw("! a comment"), &SyntaxDictionary::new(), &excludes);
        assert!(matches!(outcome, LineOutcome::Excluded));
    }

    #[test]
    fn test_exclude_patterns_anchored() {
        let excludes = ExcludeSet::compile(&["!".to_string()]).unwrap();
        // `!` mid-line must not trigger the exclude
        let outcome = parse(
            &raw("##div[data-x=\"a!b\"]"),
            &SyntaxDictionary::new(),
            &excludes,
        );
        assert!(matches!(outcome, LineOutcome::Parsed(_)));
    }

    #[test]
    fn test_parse_hosts_dialect() {
        let outcome = parse(
            &raw_with_dialect("0.0.0.0 ads.example.com", Dialect::Hosts),
            &SyntaxDictionary::new(),
            &ExcludeSet::empty(),
        );
        match outcome {
            LineOutcome::Parsed(rule) => {
                assert_eq!(rule.kind, RuleKind::Network);
                assert_eq!(rule.pattern, "||ads.example.com^");
            }
            other => panic!("expected parsed rule, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_adguard_dialect_scriptlet() {
        let outcome = parse(
            &raw_with_dialect(
                r#"example.com#%#//scriptlet("abort-on-property-read", "adBlockDetected")"#,
                Dialect::Adguard,
            ),
            &SyntaxDictionary::new(),
            &ExcludeSet::empty(),
        );
        match outcome {
            LineOutcome::Parsed(rule) => {
                assert_eq!(rule.kind, RuleKind::Scriptlet);
                assert_eq!(rule.pattern, "+js(aopr, adBlockDetected)");
                assert_eq!(rule.domains_applied, vec!["example.com"]);
            }
            other => panic!("expected parsed rule, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_dialect_token() {
        let outcome = parse(
            &raw_with_dialect("example.com#%#window.ads = 0;", Dialect::Adguard),
            &SyntaxDictionary::new(),
            &ExcludeSet::empty(),
        );
        match outcome {
            LineOutcome::Rejected(rejected) => {
                assert_eq!(rejected.reason, RejectReason::UnknownDialectToken)
            }
            other => panic!("expected reject, got {:?}", other),
        }
    }

    #[test]
    fn test_split_unescaped() {
        assert_eq!(split_unescaped("a,b,c", ','), vec!["a", "b", "c"]);
        assert_eq!(split_unescaped(r"a\,b,c", ','), vec![r"a\,b", "c"]);
        assert_eq!(split_unescaped("", ','), vec![""]);
    }

    #[test]
    fn test_whitespace_in_network_pattern_rejected() {
        assert_eq!(
            parse_reject("||example .com^"),
            RejectReason::AmbiguousPatternSyntax
        );
    }
}
