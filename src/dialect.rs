//! Syntax dictionary: dialect-specific tokens mapped to canonical uBlock
//! Origin equivalents.
//!
//! The dictionary is a read-only lookup table, constructed once and passed
//! by reference to parser workers. It owns three alias maps (modifier names,
//! scriptlet names, redirect resources) plus the per-dialect line rewrites
//! for hosts-format and AdGuard sources.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::rule::RejectReason;

/// Source-specific variant of filter syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// uBlock Origin native format (canonical target)
    #[default]
    Ublock,
    /// AdBlock Plus
    Abp,
    /// AdGuard (scriptlet and CSS-injection markers need translation)
    Adguard,
    /// Hosts file / Pi-hole format (`0.0.0.0 example.com` or bare hostnames)
    Hosts,
}

impl Dialect {
    pub fn label(&self) -> &'static str {
        match self {
            Dialect::Ublock => "ublock",
            Dialect::Abp => "abp",
            Dialect::Adguard => "adguard",
            Dialect::Hosts => "hosts",
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ublock" => Ok(Dialect::Ublock),
            "abp" => Ok(Dialect::Abp),
            "adguard" => Ok(Dialect::Adguard),
            "hosts" => Ok(Dialect::Hosts),
            other => Err(format!(
                "Unknown dialect: {} (expected ublock, abp, adguard, or hosts)",
                other
            )),
        }
    }
}

/// Modifier name aliases, vendor form to canonical uBO short form.
///
/// Canonical names map to themselves implicitly; only true aliases are
/// listed here.
const MODIFIER_ALIASES: &[(&str, &str)] = &[
    ("third-party", "3p"),
    ("first-party", "1p"),
    ("xmlhttprequest", "xhr"),
    ("subdocument", "frame"),
    ("document", "doc"),
    ("stylesheet", "css"),
    ("elemhide", "ehide"),
    ("generichide", "ghide"),
    ("object-subrequest", "object"),
];

/// AdGuard scriptlet names to uBO short names.
const SCRIPTLET_ALIASES: &[(&str, &str)] = &[
    ("abort-on-property-read", "aopr"),
    ("abort-on-property-write", "aopw"),
    ("abort-current-inline-script", "acis"),
    ("set-constant", "set"),
];

/// AdGuard redirect resource names to uBO resource names.
const REDIRECT_ALIASES: &[(&str, &str)] = &[
    ("nooptext", "1x1.gif"),
    ("noopjs", "noop.js"),
    ("noopframe", "empty.html"),
];

/// AdGuard markers with no uBO equivalent. Lines carrying these are
/// rejected rather than silently mistranslated.
const UNTRANSLATABLE_ADGUARD_MARKERS: &[&str] = &["$$", "#@%#", "#$?#"];

/// Static mapping from dialect-specific tokens to canonical equivalents.
pub struct SyntaxDictionary {
    modifier_aliases: HashMap<&'static str, &'static str>,
    scriptlet_aliases: HashMap<&'static str, &'static str>,
    redirect_aliases: HashMap<&'static str, &'static str>,
    hosts_entry: Regex,
    bare_host: Regex,
    adguard_scriptlet: Regex,
    adguard_hide_css: Regex,
}

impl SyntaxDictionary {
    pub fn new() -> Self {
        Self {
            modifier_aliases: MODIFIER_ALIASES.iter().copied().collect(),
            scriptlet_aliases: SCRIPTLET_ALIASES.iter().copied().collect(),
            redirect_aliases: REDIRECT_ALIASES.iter().copied().collect(),
            // `0.0.0.0 example.com` / `127.0.0.1 example.com` / IPv6 null routes
            hosts_entry: Regex::new(r"^(?:0\.0\.0\.0|127\.0\.0\.1|::1?|0:0:0:0:0:0:0:[01])\s+(\S+)$")
                .expect("hosts entry regex is valid"),
            bare_host: Regex::new(r"^[A-Za-z0-9*][A-Za-z0-9.*_-]*$")
                .expect("bare host regex is valid"),
            adguard_scriptlet: Regex::new(r"^(?P<domains>[^#]*)#%#//scriptlet\((?P<args>.*)\)\s*$")
                .expect("adguard scriptlet regex is valid"),
            adguard_hide_css: Regex::new(
                r"^(?P<domains>[^#]*)#\$#(?P<selector>.+?)\s*\{\s*display\s*:\s*none\s*!important;?\s*\}\s*$",
            )
            .expect("adguard css regex is valid"),
        }
    }

    /// Canonical form of a modifier name. Unknown names pass through
    /// unchanged (forward compatibility).
    pub fn canonical_modifier<'a>(&self, name: &'a str) -> &'a str {
        match self.modifier_aliases.get(name) {
            Some(canonical) => canonical,
            None => name,
        }
    }

    /// Canonical uBO name for a scriptlet.
    pub fn canonical_scriptlet<'a>(&self, name: &'a str) -> &'a str {
        match self.scriptlet_aliases.get(name) {
            Some(canonical) => canonical,
            None => name,
        }
    }

    /// Canonical uBO name for a redirect resource.
    pub fn canonical_redirect<'a>(&self, resource: &'a str) -> &'a str {
        match self.redirect_aliases.get(resource) {
            Some(canonical) => canonical,
            None => resource,
        }
    }

    /// Rewrite a line from a non-canonical dialect into uBO syntax before
    /// structural parsing.
    ///
    /// Returns the (possibly untouched) line, or the reject reason when the
    /// dictionary knows the token cannot be translated.
    pub fn rewrite_line<'a>(
        &self,
        line: &'a str,
        dialect: Dialect,
    ) -> Result<Cow<'a, str>, RejectReason> {
        match dialect {
            Dialect::Ublock | Dialect::Abp => Ok(Cow::Borrowed(line)),
            Dialect::Hosts => self.rewrite_hosts_line(line),
            Dialect::Adguard => self.rewrite_adguard_line(line),
        }
    }

    /// `0.0.0.0 ads.example.com` and bare Pi-hole hostnames become
    /// `||ads.example.com^` network filters.
    fn rewrite_hosts_line<'a>(&self, line: &'a str) -> Result<Cow<'a, str>, RejectReason> {
        if let Some(caps) = self.hosts_entry.captures(line) {
            let host = &caps[1];
            // `0.0.0.0 localhost` style boilerplate carries no blocking intent
            if host == "localhost" || host == "localhost.localdomain" || host == "broadcasthost" {
                return Err(RejectReason::EmptyOrComment);
            }
            if !self.bare_host.is_match(host) {
                return Err(RejectReason::AmbiguousPatternSyntax);
            }
            return Ok(Cow::Owned(format!("||{}^", host)));
        }
        if self.bare_host.is_match(line) {
            return Ok(Cow::Owned(format!("||{}^", line)));
        }
        Err(RejectReason::AmbiguousPatternSyntax)
    }

    /// Translate AdGuard-only markers to uBO equivalents.
    fn rewrite_adguard_line<'a>(&self, line: &'a str) -> Result<Cow<'a, str>, RejectReason> {
        for marker in UNTRANSLATABLE_ADGUARD_MARKERS {
            if line.contains(marker) {
                return Err(RejectReason::UnknownDialectToken);
            }
        }

        if let Some(caps) = self.adguard_scriptlet.captures(line) {
            let domains = caps.name("domains").map(|m| m.as_str()).unwrap_or("");
            let args = self.translate_scriptlet_args(caps.name("args").map(|m| m.as_str()).unwrap_or(""));
            return Ok(Cow::Owned(format!("{}##+js({})", domains, args)));
        }
        // Raw #%# JS injection (non-scriptlet) has no uBO equivalent
        if line.contains("#%#") {
            return Err(RejectReason::UnknownDialectToken);
        }

        if let Some(caps) = self.adguard_hide_css.captures(line) {
            let domains = caps.name("domains").map(|m| m.as_str()).unwrap_or("");
            let selector = caps.name("selector").map(|m| m.as_str()).unwrap_or("");
            return Ok(Cow::Owned(format!("{}##{}", domains, selector.trim())));
        }
        // CSS injection other than display:none cannot be expressed as
        // plain element hiding
        if line.contains("#$#") {
            return Err(RejectReason::UnknownDialectToken);
        }

        Ok(Cow::Borrowed(line))
    }

    /// `"abort-on-property-read", "adBlockDetected"` -> `aopr, adBlockDetected`
    fn translate_scriptlet_args(&self, args: &str) -> String {
        let parts: Vec<String> = args
            .split(',')
            .map(|p| p.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|p| !p.is_empty())
            .collect();

        match parts.split_first() {
            Some((name, rest)) => {
                let canonical = self.canonical_scriptlet(name).to_string();
                if rest.is_empty() {
                    canonical
                } else {
                    format!("{}, {}", canonical, rest.join(", "))
                }
            }
            None => String::new(),
        }
    }
}

impl Default for SyntaxDictionary {
    fn default() -> Self {
        Self::new()
    }
}
