//! Flattened DOM snapshot
//!
//! Failure reports carry the page HTML as a string. This module parses it
//! once with `scraper` (html5ever underneath, so malformed markup still
//! yields a tree) and flattens the visible body into document-ordered
//! elements that the classifier and candidate strategies can scan cheaply.

use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Hard cap on elements kept from a single snapshot
pub const MAX_ELEMENTS: usize = 20_000;
/// Descendant text kept per element
const MAX_TEXT_CHARS: usize = 200;

const SKIPPED_SUBTREES: &[&str] = &["head", "script", "style", "noscript", "template"];

/// One element of the snapshot, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct DomElement {
    pub index: usize,
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Text of direct text children, whitespace collapsed
    pub own_text: String,
    /// Descendant text, whitespace collapsed and truncated
    pub text: String,
    pub depth: usize,
    pub parent: Option<usize>,
    /// 1-based position among siblings with the same tag
    pub nth_of_type: usize,
    /// Number of siblings (including self) with the same tag
    pub same_type_siblings: usize,
}

impl DomElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Parsed page, with lookup tables built once at parse time so per-element
/// queries stay constant time
#[derive(Debug, Clone, Default)]
pub struct DomSnapshot {
    elements: Vec<DomElement>,
    /// `(attribute, value)` occurrences; classes count once per token
    attr_counts: HashMap<(String, String), usize>,
    /// `(tag, lowercased own text)` occurrences
    text_counts: HashMap<(String, String), usize>,
    tag_counts: HashMap<String, usize>,
    /// `label[for]` target id to the first such label
    labels: HashMap<String, usize>,
    /// First element carrying each id
    ids: HashMap<String, usize>,
}

impl DomSnapshot {
    /// Parse HTML. Never fails; garbage input produces a near-empty tree.
    pub fn parse(html: &str) -> Self {
        if html.trim().is_empty() {
            return Self::default();
        }

        let document = Html::parse_document(html);
        let mut elements: Vec<DomElement> = Vec::new();
        let mut nodes: Vec<ElementRef> = Vec::new();
        let mut positions = HashMap::new();
        let mut sibling_counts: HashMap<(Option<usize>, String), usize> = HashMap::new();

        // Iterative walk so deeply nested markup cannot exhaust the stack.
        let mut stack: Vec<(ElementRef, usize, Option<usize>)> =
            vec![(document.root_element(), 0, None)];

        while let Some((element, depth, parent)) = stack.pop() {
            if elements.len() >= MAX_ELEMENTS {
                break;
            }
            let tag = element.value().name().to_ascii_lowercase();
            if SKIPPED_SUBTREES.contains(&tag.as_str()) {
                continue;
            }

            let counter = sibling_counts.entry((parent, tag.clone())).or_insert(0);
            *counter += 1;
            let nth_of_type = *counter;

            let index = elements.len();
            elements.push(DomElement {
                index,
                attrs: element
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                    .collect(),
                own_text: own_text(element),
                text: String::new(),
                depth,
                parent,
                nth_of_type,
                same_type_siblings: 0,
                tag,
            });
            nodes.push(element);
            positions.insert(element.id(), index);

            let children: Vec<ElementRef> = element.children().filter_map(ElementRef::wrap).collect();
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1, Some(index)));
            }
        }

        // Children always follow their parent, so a reverse pass sees every
        // child's text before the parent needs it.
        let mut texts = vec![String::new(); elements.len()];
        for index in (0..nodes.len()).rev() {
            let mut text = String::new();
            for node in nodes[index].children() {
                if let Some(fragment) = node.value().as_text() {
                    text.push_str(fragment);
                } else if let Some(&child) = positions.get(&node.id()) {
                    text.push_str(&texts[child]);
                }
                text.push(' ');
                if text.len() > MAX_TEXT_CHARS * 4 {
                    break;
                }
            }
            texts[index] = collapse_whitespace(&text, MAX_TEXT_CHARS);
        }

        let mut snapshot = Self::default();
        for (element, text) in elements.iter_mut().zip(texts) {
            element.text = text;
            element.same_type_siblings = sibling_counts
                .get(&(element.parent, element.tag.clone()))
                .copied()
                .unwrap_or(1);
            snapshot.index(element);
        }
        snapshot.elements = elements;
        snapshot
    }

    fn index(&mut self, element: &DomElement) {
        let mut classes: Vec<&str> = element.classes().collect();
        classes.sort_unstable();
        classes.dedup();
        for class in classes {
            *self
                .attr_counts
                .entry(("class".to_string(), class.to_string()))
                .or_insert(0) += 1;
        }
        for (name, value) in &element.attrs {
            if name != "class" {
                *self.attr_counts.entry((name.clone(), value.clone())).or_insert(0) += 1;
            }
        }

        *self
            .text_counts
            .entry((element.tag.clone(), element.own_text.to_lowercase()))
            .or_insert(0) += 1;
        *self.tag_counts.entry(element.tag.clone()).or_insert(0) += 1;

        if let Some(id) = element.attr("id") {
            self.ids.entry(id.to_string()).or_insert(element.index);
        }
        if element.tag == "label" {
            if let Some(target) = element.attr("for") {
                self.labels.entry(target.to_string()).or_insert(element.index);
            }
        }
    }

    pub fn elements(&self) -> &[DomElement] {
        &self.elements
    }

    pub fn get(&self, index: usize) -> Option<&DomElement> {
        self.elements.get(index)
    }

    /// True when nothing beyond the implicit `html`/`body` shell was parsed
    pub fn is_empty(&self) -> bool {
        self.tag_counts
            .keys()
            .all(|tag| tag == "html" || tag == "body")
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.count_tag(&tag.to_ascii_lowercase()) > 0
    }

    pub fn find_by_id(&self, id: &str) -> Option<&DomElement> {
        self.ids.get(id).and_then(|&index| self.get(index))
    }

    /// Elements carrying `name="value"`, or the class for `name == "class"`
    pub fn count_attr(&self, name: &str, value: &str) -> usize {
        self.attr_counts
            .get(&(name.to_string(), value.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// `tag` elements whose own text equals `text`, ignoring case
    pub fn count_text(&self, tag: &str, text: &str) -> usize {
        self.text_counts
            .get(&(tag.to_string(), text.to_lowercase()))
            .copied()
            .unwrap_or(0)
    }

    pub fn count_tag(&self, tag: &str) -> usize {
        self.tag_counts.get(tag).copied().unwrap_or(0)
    }

    /// Ancestors from nearest to farthest
    pub fn ancestors(&self, element: &DomElement) -> Ancestors<'_> {
        Ancestors {
            snapshot: self,
            next: element.parent,
        }
    }

    /// Text of the `<label for=...>` pointing at this element, if any
    pub fn label_for(&self, element: &DomElement) -> Option<&str> {
        let id = element.attr("id")?;
        self.labels
            .get(id)
            .and_then(|&index| self.get(index))
            .map(|label| label.text.as_str())
            .filter(|text| !text.is_empty())
    }
}

pub struct Ancestors<'a> {
    snapshot: &'a DomSnapshot,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a DomElement;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.snapshot.get(self.next?)?;
        self.next = element.parent;
        Some(element)
    }
}

fn own_text(element: ElementRef) -> String {
    let mut text = String::new();
    for node in element.children() {
        if let Some(fragment) = node.value().as_text() {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    collapse_whitespace(&text, MAX_TEXT_CHARS)
}

/// Collapse runs of whitespace and cap the result at `max_chars` characters
pub fn collapse_whitespace(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut chars = 0;
    for word in text.split_whitespace() {
        if chars > 0 {
            out.push(' ');
            chars += 1;
        }
        for ch in word.chars() {
            if chars >= max_chars {
                return out;
            }
            out.push(ch);
            chars += 1;
        }
        if chars >= max_chars {
            return out;
        }
    }
    out
}
