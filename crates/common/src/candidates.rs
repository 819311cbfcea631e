//! Replacement selector generation
//!
//! Given a selector that no longer matches and the page HTML captured at
//! failure time, four independent strategies propose replacement selectors:
//!
//! - attribute: elements whose stable attributes resemble the identifiers in
//!   the original selector (`#submit-btn` -> `[data-testid="submit-button"]`)
//! - aria: role plus accessible name
//! - text: visible text implied by the original selector
//! - structural: elements sitting where the original path points
//!
//! Every score is a strategy constant from the tables below multiplied by
//! match-quality factors, so a more specific match never scores lower and
//! no score leaves [0, 1]. The generator never fails: unparseable selectors
//! or markup just produce fewer candidates.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::dom::{DomElement, DomSnapshot};
use crate::locator::{implicit_role_for_tag, tokenize, SelectorHint};
use crate::types::{HealingConfig, SelectorCandidate, Strategy};

/// Base weight per attribute, highest for attributes least likely to be
/// generated by a framework
const ATTRIBUTE_WEIGHTS: &[(&str, f64)] = &[
    ("data-testid", 0.95),
    ("data-test-id", 0.95),
    ("data-test", 0.93),
    ("data-cy", 0.93),
    ("data-qa", 0.93),
    ("id", 0.88),
    ("name", 0.82),
    ("aria-label", 0.80),
    ("placeholder", 0.72),
    ("title", 0.70),
    ("class", 0.60),
];

/// Weight for `data-*` attributes not listed above
const OTHER_DATA_ATTRIBUTE_WEIGHT: f64 = 0.78;

/// Multipliers applied on top of a strategy's base score
mod modifier {
    /// Element tag differs from the tag the original selector named or implied
    pub const TAG_MISMATCH: f64 = 0.85;
    /// Attribute value looks framework-generated (`ember123`, `css-1x9f2k`)
    pub const GENERATED_VALUE: f64 = 0.70;
    /// Match found on a different attribute than the original used
    pub const CROSS_ATTRIBUTE: f64 = 0.95;
    /// Matched against text derived from identifiers rather than stated
    pub const DERIVED_HINT: f64 = 0.90;
    /// ARIA match when the original selector implies no role
    pub const UNKNOWN_ROLE: f64 = 0.85;
    /// Structural match on a tag implied by identifier words
    pub const IMPLIED_TAG: f64 = 0.80;
}

mod text_score {
    pub const EXACT: f64 = 0.75;
    pub const SUBSTRING_BASE: f64 = 0.45;
    pub const SUBSTRING_SPAN: f64 = 0.20;
}

mod aria_score {
    pub const EXACT: f64 = 0.85;
    pub const PARTIAL_BASE: f64 = 0.60;
    pub const PARTIAL_SPAN: f64 = 0.15;
}

mod structural_score {
    pub const BASE: f64 = 0.30;
    pub const SPAN: f64 = 0.20;
    /// Positional guesses kept after ranking
    pub const KEEP: usize = 3;
}

/// Token-set overlap needed before two identifiers count as related
const MIN_PARTIAL_OVERLAP: f64 = 0.5;

/// Text longer than this is not turned into a text selector
const MAX_SELECTOR_TEXT_CHARS: usize = 80;

/// Nearest ancestors compared against the original selector's path
const MAX_ANCESTOR_WALK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum MatchQuality {
    Exact,
    /// Same words once case, separators and abbreviations are normalized
    Normalized,
    /// Token-set Jaccard overlap
    Partial(f64),
}

impl MatchQuality {
    fn score(self) -> f64 {
        match self {
            MatchQuality::Exact => 1.0,
            MatchQuality::Normalized => 0.95,
            MatchQuality::Partial(overlap) => 0.55 + 0.35 * overlap,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MatchQuality::Exact => "exact",
            MatchQuality::Normalized => "normalized",
            MatchQuality::Partial(_) => "partial",
        }
    }
}

fn ambiguity_factor(matches: usize) -> f64 {
    match matches {
        0 | 1 => 1.0,
        2 => 0.75,
        _ => 0.5,
    }
}

/// Generator with a guard on snapshot size
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    max_dom_bytes: usize,
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new(HealingConfig::default().max_dom_bytes)
    }
}

impl CandidateGenerator {
    pub fn new(max_dom_bytes: usize) -> Self {
        Self { max_dom_bytes }
    }

    pub fn from_config(config: &HealingConfig) -> Self {
        Self::new(config.max_dom_bytes)
    }

    /// Ranked replacement candidates for `original`, at most `max_results`.
    /// Deterministic for identical inputs.
    pub fn find_alternatives(
        &self,
        original: &str,
        dom: &str,
        max_results: usize,
    ) -> Vec<SelectorCandidate> {
        if max_results == 0 || dom.trim().is_empty() {
            return Vec::new();
        }
        if dom.len() > self.max_dom_bytes {
            debug!(
                dom_bytes = dom.len(),
                limit = self.max_dom_bytes,
                "DOM snapshot too large, skipping candidate generation"
            );
            return Vec::new();
        }
        let snapshot = DomSnapshot::parse(dom);
        self.find_in_snapshot(original, &snapshot, max_results)
    }

    /// Same as [`find_alternatives`](Self::find_alternatives) over an
    /// already parsed snapshot
    pub fn find_in_snapshot(
        &self,
        original: &str,
        snapshot: &DomSnapshot,
        max_results: usize,
    ) -> Vec<SelectorCandidate> {
        if max_results == 0 || snapshot.is_empty() {
            return Vec::new();
        }
        let hint = SelectorHint::parse(original);

        let mut all = Vec::new();
        all.extend(attribute_candidates(&hint, snapshot));
        all.extend(aria_candidates(&hint, snapshot));
        all.extend(text_candidates(&hint, snapshot));
        all.extend(structural_candidates(&hint, snapshot));

        let ranked = merge(all, original, max_results);
        debug!(
            selector = original,
            candidates = ranked.len(),
            top = ranked.first().map(|c| c.selector.as_str()).unwrap_or(""),
            "generated selector candidates"
        );
        ranked
    }
}

/// Convenience wrapper using the default size guard
pub fn find_alternatives(original: &str, dom: &str, max_results: usize) -> Vec<SelectorCandidate> {
    CandidateGenerator::default().find_alternatives(original, dom, max_results)
}

fn merge(candidates: Vec<SelectorCandidate>, original: &str, max_results: usize) -> Vec<SelectorCandidate> {
    let mut best: HashMap<String, SelectorCandidate> = HashMap::new();
    for mut candidate in candidates {
        if candidate.selector == original.trim() {
            continue;
        }
        candidate.confidence_score =
            ((candidate.confidence_score.clamp(0.0, 1.0)) * 10_000.0).round() / 10_000.0;
        let keep_existing = best.get(&candidate.selector).map_or(false, |existing| {
            existing.confidence_score > candidate.confidence_score
                || (existing.confidence_score == candidate.confidence_score
                    && existing.strategy.priority() <= candidate.strategy.priority())
        });
        if !keep_existing {
            best.insert(candidate.selector.clone(), candidate);
        }
    }

    let mut ranked: Vec<SelectorCandidate> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| a.strategy.priority().cmp(&b.strategy.priority()))
            .then_with(|| a.selector.cmp(&b.selector))
    });
    ranked.truncate(max_results);
    ranked
}

fn attribute_weight(name: &str) -> Option<f64> {
    ATTRIBUTE_WEIGHTS
        .iter()
        .find(|(attr, _)| *attr == name)
        .map(|(_, weight)| *weight)
        .or_else(|| name.starts_with("data-").then_some(OTHER_DATA_ATTRIBUTE_WEIGHT))
}

fn match_quality(wanted: &str, found: &str) -> Option<MatchQuality> {
    if wanted.is_empty() || found.is_empty() {
        return None;
    }
    if wanted == found {
        return Some(MatchQuality::Exact);
    }
    let wanted_tokens = tokenize(wanted);
    let found_tokens = tokenize(found);
    if wanted_tokens.is_empty() || found_tokens.is_empty() {
        return None;
    }
    if wanted_tokens == found_tokens {
        return Some(MatchQuality::Normalized);
    }
    let overlap = jaccard(&wanted_tokens, &found_tokens);
    if overlap >= 1.0 {
        Some(MatchQuality::Normalized)
    } else if overlap >= MIN_PARTIAL_OVERLAP {
        Some(MatchQuality::Partial(overlap))
    } else {
        None
    }
}

fn jaccard(a: &[String], b: &[String]) -> f64 {
    let mut a_set: Vec<&String> = a.iter().collect();
    a_set.sort();
    a_set.dedup();
    let mut b_set: Vec<&String> = b.iter().collect();
    b_set.sort();
    b_set.dedup();
    let shared = a_set.iter().filter(|t| b_set.contains(t)).count();
    let union = a_set.len() + b_set.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

static FRAMEWORK_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:ember\d|ext-gen|yui_|ng-tns-|css-|sc-|jsx-|makestyles-|mui-\d|svelte-|_ngcontent|react-select-\d)")
        .expect("framework prefix pattern")
});

/// Heuristic for values a framework or build step generated
pub fn looks_generated(value: &str) -> bool {
    if FRAMEWORK_PREFIX.is_match(value) {
        return true;
    }
    let mut digit_run = 0;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digit_run += 1;
            if digit_run >= 4 {
                return true;
            }
        } else {
            digit_run = 0;
        }
    }
    value
        .split(|c: char| c == '-' || c == '_' || c == ':')
        .any(|chunk| {
            chunk.len() >= 5
                && chunk.chars().any(|c| c.is_ascii_digit())
                && chunk.chars().any(|c| c.is_ascii_alphabetic())
        })
}

fn is_css_ident(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn attribute_selector(name: &str, value: &str) -> String {
    match name {
        "id" if is_css_ident(value) => format!("#{}", value),
        "class" if is_css_ident(value) => format!(".{}", value),
        _ => format!("[{}=\"{}\"]", name, quote(value)),
    }
}

fn element_values<'a>(element: &'a DomElement) -> Vec<(&'a str, &'a str)> {
    let mut values = Vec::new();
    for (name, value) in &element.attrs {
        if name == "class" {
            values.extend(value.split_whitespace().map(|class| ("class", class)));
        } else if attribute_weight(name).is_some() && !value.trim().is_empty() {
            values.push((name.as_str(), value.as_str()));
        }
    }
    values
}

fn attribute_candidates(hint: &SelectorHint, snapshot: &DomSnapshot) -> Vec<SelectorCandidate> {
    let mut wanted: Vec<(String, String, bool)> = hint
        .identifier_values()
        .into_iter()
        .map(|(name, value)| (name, value, false))
        .collect();
    if let Some(text) = hint.explicit_text() {
        wanted.push((String::new(), text, true));
    }
    if wanted.is_empty() {
        return Vec::new();
    }
    let expected_tag = hint.implied_tag();

    let mut out = Vec::new();
    for element in snapshot.elements() {
        for (attr, value) in element_values(element) {
            let weight = match attribute_weight(attr) {
                Some(weight) => weight,
                None => continue,
            };

            let best = wanted
                .iter()
                .filter_map(|(wanted_attr, wanted_value, derived)| {
                    let quality = match_quality(wanted_value, value)?;
                    let mut score = quality.score();
                    if *derived {
                        score *= modifier::DERIVED_HINT;
                    } else if wanted_attr != attr {
                        score *= modifier::CROSS_ATTRIBUTE;
                    }
                    Some((score, quality, wanted_attr, wanted_value))
                })
                .max_by(|a, b| a.0.total_cmp(&b.0));
            let Some((quality_score, quality, wanted_attr, wanted_value)) = best else {
                continue;
            };

            let mut score = weight * quality_score;
            let mut notes = Vec::new();
            if let Some(tag) = &expected_tag {
                if *tag != element.tag {
                    score *= modifier::TAG_MISMATCH;
                    notes.push(format!("expected <{}>", tag));
                }
            }
            if looks_generated(value) {
                score *= modifier::GENERATED_VALUE;
                notes.push("value looks generated".to_string());
            }
            let matches = snapshot.count_attr(attr, value);
            score *= ambiguity_factor(matches);
            if matches > 1 {
                notes.push(format!("{} elements share it", matches));
            }

            let source = if wanted_attr.is_empty() {
                format!("text \"{}\"", wanted_value)
            } else {
                format!("{} \"{}\"", wanted_attr, wanted_value)
            };
            let mut rationale = format!(
                "<{}> {} \"{}\" matches {} ({})",
                element.tag,
                attr,
                value,
                source,
                quality.label()
            );
            if !notes.is_empty() {
                rationale.push_str("; ");
                rationale.push_str(&notes.join(", "));
            }

            out.push(SelectorCandidate {
                selector: attribute_selector(attr, value),
                strategy: Strategy::Attribute,
                confidence_score: score,
                rationale,
            });
        }
    }
    out
}

/// Explicit text when the selector states one, else a phrase derived from
/// its identifiers
fn target_text(hint: &SelectorHint) -> Option<(String, bool)> {
    hint.explicit_text()
        .map(|text| (text, false))
        .or_else(|| hint.derived_text().map(|text| (text, true)))
        .map(|(text, derived)| (crate::dom::collapse_whitespace(&text, MAX_SELECTOR_TEXT_CHARS), derived))
        .filter(|(text, _)| !text.is_empty())
}

fn text_overlap(wanted: &str, found: &str) -> Option<(bool, f64, String)> {
    let wanted_lower = wanted.to_lowercase();
    let found_lower = found.to_lowercase();
    if wanted_lower == found_lower {
        return Some((true, 1.0, found.to_string()));
    }
    let (shorter, longer, shared) = if found_lower.contains(&wanted_lower) {
        (wanted_lower.chars().count(), found_lower.chars().count(), wanted.to_string())
    } else if wanted_lower.contains(&found_lower) {
        (found_lower.chars().count(), wanted_lower.chars().count(), found.to_string())
    } else {
        return None;
    };
    if shorter < 2 {
        return None;
    }
    Some((false, shorter as f64 / longer as f64, shared))
}

fn text_candidates(hint: &SelectorHint, snapshot: &DomSnapshot) -> Vec<SelectorCandidate> {
    let Some((wanted, derived)) = target_text(hint) else {
        return Vec::new();
    };

    // Substring counts keyed by (tag, lowercased shared text)
    let mut substring_counts: HashMap<(&str, String), usize> = HashMap::new();
    let mut out = Vec::new();
    for element in snapshot.elements() {
        let text = &element.own_text;
        if text.is_empty() || text.chars().count() > MAX_SELECTOR_TEXT_CHARS {
            continue;
        }
        let Some((exact, ratio, shared)) = text_overlap(&wanted, text) else {
            continue;
        };

        let mut score = if exact {
            text_score::EXACT
        } else {
            text_score::SUBSTRING_BASE + text_score::SUBSTRING_SPAN * ratio
        };
        if derived {
            score *= modifier::DERIVED_HINT;
        }
        let matches = if exact {
            snapshot.count_text(&element.tag, text)
        } else {
            let shared_lower = shared.to_lowercase();
            *substring_counts
                .entry((element.tag.as_str(), shared_lower))
                .or_insert_with_key(|(tag, shared_lower)| {
                    snapshot
                        .elements()
                        .iter()
                        .filter(|other| {
                            other.tag == *tag && other.own_text.to_lowercase().contains(shared_lower.as_str())
                        })
                        .count()
                })
        };
        score *= ambiguity_factor(matches);

        let (selector, how) = if exact {
            (format!("{}:text-is(\"{}\")", element.tag, quote(text)), "exact")
        } else {
            (format!("{}:has-text(\"{}\")", element.tag, quote(&shared)), "substring")
        };
        out.push(SelectorCandidate {
            selector,
            strategy: Strategy::TextContent,
            confidence_score: score,
            rationale: format!(
                "<{}> text \"{}\" matches {}\"{}\" ({})",
                element.tag,
                text,
                if derived { "derived " } else { "" },
                wanted,
                how
            ),
        });
    }
    out
}

fn element_role(element: &DomElement) -> Option<String> {
    if let Some(role) = element.attr("role").and_then(|r| r.split_whitespace().next()) {
        return Some(role.to_ascii_lowercase());
    }
    if element.tag == "input" {
        let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
        let role = match kind.as_str() {
            "hidden" => return None,
            "checkbox" => "checkbox",
            "radio" => "radio",
            "submit" | "button" | "reset" | "image" => "button",
            _ => "textbox",
        };
        return Some(role.to_string());
    }
    implicit_role_for_tag(&element.tag).map(str::to_string)
}

fn accessible_name(snapshot: &DomSnapshot, element: &DomElement) -> Option<String> {
    let non_empty = |value: Option<&str>| {
        value
            .map(|v| crate::dom::collapse_whitespace(v, MAX_SELECTOR_TEXT_CHARS))
            .filter(|v| !v.is_empty())
    };
    non_empty(element.attr("aria-label"))
        .or_else(|| non_empty(snapshot.label_for(element)))
        .or_else(|| non_empty(Some(element.text.as_str())))
        .or_else(|| non_empty(element.attr("alt")))
        .or_else(|| non_empty(element.attr("title")))
        .or_else(|| non_empty(element.attr("placeholder")))
        .or_else(|| {
            (element.tag == "input")
                .then(|| non_empty(element.attr("value")))
                .flatten()
        })
}

fn aria_candidates(hint: &SelectorHint, snapshot: &DomSnapshot) -> Vec<SelectorCandidate> {
    let Some((wanted, derived)) = target_text(hint) else {
        return Vec::new();
    };
    let wanted_role = hint.implied_role();

    let named: Vec<(&DomElement, String, String)> = snapshot
        .elements()
        .iter()
        .filter_map(|element| {
            let role = element_role(element)?;
            let name = accessible_name(snapshot, element)?;
            Some((element, role, name))
        })
        .collect();

    let mut name_counts: HashMap<(&str, String), usize> = HashMap::new();
    for (_, role, name) in &named {
        *name_counts.entry((role.as_str(), name.to_lowercase())).or_insert(0) += 1;
    }

    let mut out = Vec::new();
    for (element, role, name) in &named {
        if let Some(wanted_role) = &wanted_role {
            if wanted_role != role {
                continue;
            }
        }
        let Some((exact, ratio, _)) = text_overlap(&wanted, name) else {
            continue;
        };

        let mut score = if exact {
            aria_score::EXACT
        } else {
            aria_score::PARTIAL_BASE + aria_score::PARTIAL_SPAN * ratio
        };
        if wanted_role.is_none() {
            score *= modifier::UNKNOWN_ROLE;
        }
        if derived {
            score *= modifier::DERIVED_HINT;
        }
        let matches = name_counts
            .get(&(role.as_str(), name.to_lowercase()))
            .copied()
            .unwrap_or(1);
        score *= ambiguity_factor(matches);

        out.push(SelectorCandidate {
            selector: format!("role={}[name=\"{}\"]", role, quote(name)),
            strategy: Strategy::Aria,
            confidence_score: score,
            rationale: format!(
                "<{}> role {} named \"{}\" matches \"{}\" ({})",
                element.tag,
                role,
                name,
                wanted,
                if exact { "exact" } else { "partial" }
            ),
        });
    }
    out
}

fn compound_matches(compound: &crate::locator::Compound, element: &DomElement) -> bool {
    compound.tag.as_deref().map_or(true, |tag| tag == element.tag)
        && compound
            .id
            .as_deref()
            .map_or(true, |id| element.attr("id") == Some(id))
        && compound.classes.iter().all(|class| element.has_class(class))
        && compound.attributes.iter().all(|(name, value)| {
            if value.is_empty() {
                element.attr(name).is_some()
            } else {
                element.attr(name) == Some(value.as_str())
            }
        })
}

fn is_stable_id(id: &str) -> bool {
    is_css_ident(id) && !looks_generated(id)
}

/// `nth-of-type` path from the nearest stable id (or `body`) down to the
/// element
fn structural_path(snapshot: &DomSnapshot, element: &DomElement) -> String {
    let step = |e: &DomElement| {
        if e.same_type_siblings > 1 {
            format!("{}:nth-of-type({})", e.tag, e.nth_of_type)
        } else {
            e.tag.clone()
        }
    };
    let mut steps = vec![step(element)];
    for ancestor in snapshot.ancestors(element) {
        if ancestor.tag == "body" || ancestor.tag == "html" {
            steps.push("body".to_string());
            break;
        }
        if let Some(id) = ancestor.attr("id").filter(|id| is_stable_id(id)) {
            steps.push(format!("#{}", id));
            break;
        }
        steps.push(step(ancestor));
    }
    steps.reverse();
    steps.join(" > ")
}

fn ancestor_score(hint: &SelectorHint, snapshot: &DomSnapshot, element: &DomElement) -> f64 {
    let wanted = hint.ancestors();
    if wanted.is_empty() {
        return 0.5;
    }
    let mut dom_ancestors: Vec<&DomElement> =
        snapshot.ancestors(element).take(MAX_ANCESTOR_WALK).collect();
    dom_ancestors.reverse();
    let mut matched = 0;
    let mut cursor = 0;
    for compound in wanted {
        if let Some(offset) = dom_ancestors[cursor..]
            .iter()
            .position(|ancestor| compound_matches(compound, ancestor))
        {
            matched += 1;
            cursor += offset + 1;
        }
    }
    matched as f64 / wanted.len() as f64
}

fn structural_candidates(hint: &SelectorHint, snapshot: &DomSnapshot) -> Vec<SelectorCandidate> {
    let explicit_tag = hint.tag().map(str::to_string);
    let Some(tag) = explicit_tag.clone().or_else(|| hint.implied_tag()) else {
        return Vec::new();
    };
    let wanted_nth = hint.target().and_then(|c| c.nth);
    let expected_depth = hint.anchored.then(|| {
        let offset = match hint.compounds.first().and_then(|c| c.tag.as_deref()) {
            Some("html") => 0,
            _ => 1,
        };
        offset + hint.compounds.len() - 1
    });

    let mut scored: Vec<(f64, &DomElement)> = snapshot
        .elements()
        .iter()
        .filter(|e| e.tag == tag && e.depth >= 2)
        .map(|element| {
            let nth = match wanted_nth {
                Some(n) if n == element.nth_of_type => 1.0,
                Some(_) => 0.0,
                None => 0.5,
            };
            let depth = match expected_depth {
                Some(expected) => 1.0 / (1.0 + element.depth.abs_diff(expected) as f64),
                None => 0.5,
            };
            let quality = 0.5 * ancestor_score(hint, snapshot, element) + 0.25 * nth + 0.25 * depth;
            let mut score = structural_score::BASE + structural_score::SPAN * quality;
            if explicit_tag.is_none() {
                score *= modifier::IMPLIED_TAG;
            }
            (score, element)
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.index.cmp(&b.1.index)));
    scored
        .into_iter()
        .take(structural_score::KEEP)
        .map(|(score, element)| SelectorCandidate {
            selector: structural_path(snapshot, element),
            strategy: Strategy::Structural,
            confidence_score: score,
            rationale: format!(
                "<{}> at depth {} position {} of {} resembles the original path",
                element.tag, element.depth, element.nth_of_type, element.same_type_siblings
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Strategy;
    use proptest::prelude::*;

    const CHECKOUT: &str = r#"
        <html><body>
          <main id="content">
            <form id="checkout">
              <label for="email-input">Email</label>
              <input id="email-input" name="email" type="email">
              <button data-testid="submit-button" class="btn primary">Submit</button>
            </form>
          </main>
        </body></html>
    "#;

    #[test]
    fn test_renamed_id_heals_to_test_id() {
        let candidates = find_alternatives("#submit-btn", CHECKOUT, 5);
        let top = &candidates[0];
        assert_eq!(top.selector, r#"[data-testid="submit-button"]"#);
        assert_eq!(top.strategy, Strategy::Attribute);
        assert!(top.confidence_score >= 0.8, "{:?}", top);
    }

    #[test]
    fn test_results_sorted_bounded_and_deduplicated() {
        let candidates = find_alternatives("#submit-btn", CHECKOUT, 10);
        assert!(candidates.len() > 1);
        for pair in candidates.windows(2) {
            assert!(pair[0].confidence_score >= pair[1].confidence_score);
        }
        let mut selectors: Vec<&str> = candidates.iter().map(|c| c.selector.as_str()).collect();
        selectors.sort();
        selectors.dedup();
        assert_eq!(selectors.len(), candidates.len());
        assert!(candidates
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.confidence_score)));
        assert!(candidates.iter().all(|c| c.selector != "#submit-btn"));
    }

    #[test]
    fn test_each_strategy_contributes() {
        let candidates = find_alternatives("#submit-btn", CHECKOUT, 20);
        let has = |s: Strategy| candidates.iter().any(|c| c.strategy == s);
        assert!(has(Strategy::Attribute));
        assert!(has(Strategy::Aria));
        assert!(has(Strategy::TextContent));
        assert!(has(Strategy::Structural));

        let aria = candidates.iter().find(|c| c.strategy == Strategy::Aria).unwrap();
        assert_eq!(aria.selector, r#"role=button[name="Submit"]"#);
        let text = candidates
            .iter()
            .find(|c| c.strategy == Strategy::TextContent)
            .unwrap();
        assert_eq!(text.selector, r#"button:text-is("Submit")"#);
        let structural = candidates
            .iter()
            .find(|c| c.strategy == Strategy::Structural)
            .unwrap();
        assert_eq!(structural.selector, "#checkout > button");
        assert!(structural.confidence_score < text.confidence_score);
        assert!(text.confidence_score < aria.confidence_score);
    }

    #[test]
    fn test_truncates_to_max_results() {
        assert_eq!(find_alternatives("#submit-btn", CHECKOUT, 1).len(), 1);
        assert!(find_alternatives("#submit-btn", CHECKOUT, 0).is_empty());
    }

    #[test]
    fn test_exact_text_beats_substring() {
        let html = r#"<body><a href="/a">Sign in</a><a href="/b">Sign in with SSO</a></body>"#;
        let candidates = find_alternatives("text=Sign in", html, 10);
        let exact = candidates
            .iter()
            .find(|c| c.selector == r#"a:text-is("Sign in")"#)
            .unwrap();
        let partial = candidates
            .iter()
            .filter(|c| c.strategy == Strategy::TextContent)
            .find(|c| c.selector.contains("has-text"))
            .unwrap();
        assert!(exact.confidence_score > partial.confidence_score);
    }

    #[test]
    fn test_stable_attribute_outranks_class() {
        let html = r#"<body>
            <input name="username" class="username">
        </body>"#;
        let candidates = find_alternatives("#username", html, 10);
        let name = candidates.iter().find(|c| c.selector == r#"[name="username"]"#).unwrap();
        let class = candidates.iter().find(|c| c.selector == ".username").unwrap();
        assert!(name.confidence_score > class.confidence_score);
    }

    #[test]
    fn test_ambiguity_and_generated_values_lower_confidence() {
        let unique = find_alternatives("#save", r#"<body><button name="save">Go</button></body>"#, 5);
        let shared = find_alternatives(
            "#save",
            r#"<body><button name="save">Go</button><button name="save">Go</button></body>"#,
            5,
        );
        let pick = |c: &[SelectorCandidate]| {
            c.iter()
                .find(|c| c.selector == r#"[name="save"]"#)
                .map(|c| c.confidence_score)
                .unwrap()
        };
        assert!(pick(&unique) > pick(&shared));

        assert!(looks_generated("ember1234"));
        assert!(looks_generated("css-1x9f2k"));
        assert!(looks_generated("btn-a8f3e2"));
        assert!(!looks_generated("submit-button"));
        assert!(!looks_generated("step-2"));
    }

    #[test]
    fn test_structural_prefers_matching_position() {
        let html = r#"<html><body><ul>
            <li>One</li><li>Two</li><li>Three</li>
        </ul></body></html>"#;
        let candidates = find_alternatives("body > ul > li:nth-child(4)", html, 10);
        assert!(candidates.iter().all(|c| c.strategy == Strategy::Structural));
        assert_eq!(candidates.len(), 3);
        assert!(candidates
            .iter()
            .all(|c| c.confidence_score >= 0.3 && c.confidence_score <= 0.5));

        let nth = find_alternatives("body > ul > li:nth-child(2)", html, 1);
        assert_eq!(nth[0].selector, "body > ul > li:nth-of-type(2)");
    }

    #[test]
    fn test_degenerate_inputs_yield_nothing() {
        assert!(find_alternatives("#a", "", 5).is_empty());
        assert!(find_alternatives("#a", "   ", 5).is_empty());
        assert!(find_alternatives("", CHECKOUT, 5)
            .iter()
            .all(|c| c.strategy != Strategy::Attribute));
        let tiny = CandidateGenerator::new(16);
        assert!(tiny.find_alternatives("#submit-btn", CHECKOUT, 5).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let first = find_alternatives("form > .btn", CHECKOUT, 10);
        for _ in 0..5 {
            assert_eq!(find_alternatives("form > .btn", CHECKOUT, 10), first);
        }
    }

    #[test]
    fn test_large_repetitive_page_stays_linear() {
        let html = format!("<html><body><ul>{}</ul></body></html>", "<li>Item</li>".repeat(20_000));
        let started = std::time::Instant::now();
        let candidates = find_alternatives("text=Item", &html, 5);
        let elapsed = started.elapsed();
        assert!(elapsed < std::time::Duration::from_secs(10), "took {:?}", elapsed);

        let text = candidates
            .iter()
            .find(|c| c.selector == r#"li:text-is("Item")"#)
            .unwrap();
        assert_eq!(text.confidence_score, text_score::EXACT * ambiguity_factor(20_000));
        assert!(candidates
            .iter()
            .any(|c| c.selector == r#"role=listitem[name="Item"]"#));
    }

    proptest! {
        #[test]
        fn prop_never_panics_and_stays_bounded(selector in ".{0,40}", html in ".{0,200}") {
            let candidates = find_alternatives(&selector, &html, 5);
            prop_assert!(candidates.len() <= 5);
            for candidate in candidates {
                prop_assert!((0.0..=1.0).contains(&candidate.confidence_score));
            }
        }
    }
}
