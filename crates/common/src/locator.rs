//! Best-effort parsing of broken selectors into matching hints
//!
//! A failing selector no longer matches anything, so it cannot be evaluated
//! against the page. What it still carries is intent: the tag it expected,
//! the id or test id it pointed at, the visible text or role it was written
//! against, and roughly where in the tree the element used to live. This
//! module pulls that intent out of CSS, XPath and Playwright-style
//! (`text=`, `role=`, `getByRole(...)`) selectors. Anything unparseable is
//! simply ignored.

use once_cell::sync::Lazy;
use regex::Regex;

/// One simple selector step (`div.row:nth-of-type(2)`, `//button[@id='x']`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Attribute predicates; the value is empty for presence checks
    pub attributes: Vec<(String, String)>,
    pub nth: Option<usize>,
    pub text: Option<String>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        *self == Compound::default()
    }
}

/// Intent recovered from an original selector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorHint {
    pub raw: String,
    /// Outermost first; the last entry is the target element
    pub compounds: Vec<Compound>,
    /// True when every step is a direct child step starting at html/body
    pub anchored: bool,
    pub role: Option<String>,
    /// Accessible name given alongside a role
    pub name: Option<String>,
}

/// Words that describe the kind of control rather than its label
const KIND_WORDS: &[(&str, Option<&str>)] = &[
    ("button", Some("button")),
    ("submit", None),
    ("link", Some("link")),
    ("anchor", Some("link")),
    ("input", Some("textbox")),
    ("field", Some("textbox")),
    ("textbox", Some("textbox")),
    ("textarea", Some("textbox")),
    ("checkbox", Some("checkbox")),
    ("radio", Some("radio")),
    ("select", Some("combobox")),
    ("dropdown", Some("combobox")),
    ("combobox", Some("combobox")),
    ("image", Some("img")),
    ("tab", Some("tab")),
    ("container", None),
    ("wrapper", None),
    ("element", None),
    ("el", None),
    ("box", None),
    ("item", None),
];

/// Common abbreviations normalized before comparing identifiers
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("btn", "button"),
    ("bttn", "button"),
    ("lnk", "link"),
    ("txt", "text"),
    ("inp", "input"),
    ("chk", "checkbox"),
    ("cb", "checkbox"),
    ("img", "image"),
    ("lbl", "label"),
    ("pwd", "password"),
    ("passwd", "password"),
    ("msg", "message"),
    ("num", "number"),
    ("qty", "quantity"),
    ("addr", "address"),
    ("desc", "description"),
    ("nav", "navigation"),
    ("ddl", "dropdown"),
    ("sel", "select"),
];

impl SelectorHint {
    pub fn parse(selector: &str) -> Self {
        let raw = selector.trim().to_string();
        let mut hint = SelectorHint {
            raw: raw.clone(),
            ..Default::default()
        };
        if raw.is_empty() {
            return hint;
        }

        // Playwright chains: only the last hop identifies the element.
        let last_hop = raw.rsplit(">>").next().unwrap_or(&raw).trim();

        if let Some(caps) = GET_BY.captures(last_hop) {
            parse_get_by(&mut hint, &caps[1], &caps[2]);
        } else if let Some(rest) = strip_engine(last_hop, "role") {
            parse_role_engine(&mut hint, rest);
        } else if let Some(rest) = strip_engine(last_hop, "text") {
            hint.compounds.push(Compound {
                text: Some(unquote(rest)),
                ..Default::default()
            });
        } else if let Some(rest) = strip_engine(last_hop, "data-testid") {
            hint.compounds.push(Compound {
                attributes: vec![("data-testid".into(), unquote(rest))],
                ..Default::default()
            });
        } else if let Some(rest) = strip_engine(last_hop, "id") {
            hint.compounds.push(Compound {
                id: Some(unquote(rest)),
                ..Default::default()
            });
        } else if let Some(rest) = strip_engine(last_hop, "xpath") {
            parse_xpath(&mut hint, rest);
        } else if last_hop.starts_with('/') || last_hop.starts_with("(/") {
            parse_xpath(&mut hint, last_hop);
        } else {
            let css = strip_engine(last_hop, "css").unwrap_or(last_hop);
            parse_css(&mut hint, css);
        }

        if hint.role.is_none() {
            hint.role = hint.target().and_then(|c| {
                c.attributes
                    .iter()
                    .find(|(k, _)| k == "role")
                    .map(|(_, v)| v.to_ascii_lowercase())
            });
        }
        hint
    }

    pub fn target(&self) -> Option<&Compound> {
        self.compounds.last()
    }

    pub fn ancestors(&self) -> &[Compound] {
        match self.compounds.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.target().and_then(|c| c.tag.as_deref())
    }

    /// Tag named by the selector, or implied by its role or identifier words
    pub fn implied_tag(&self) -> Option<String> {
        if let Some(tag) = self.tag() {
            return Some(tag.to_string());
        }
        let role = self.implied_role()?;
        let tag = match role.as_str() {
            "button" => "button",
            "link" => "a",
            "textbox" | "checkbox" | "radio" => "input",
            "combobox" => "select",
            "img" => "img",
            _ => return None,
        };
        Some(tag.to_string())
    }

    /// Explicit role, else one implied by kind words like `btn` or `link`
    pub fn implied_role(&self) -> Option<String> {
        if let Some(role) = &self.role {
            return Some(role.clone());
        }
        if let Some(role) = self.tag().and_then(implicit_role_for_tag) {
            return Some(role.to_string());
        }
        self.identifier_values()
            .iter()
            .flat_map(|(_, value)| tokenize(value))
            .find_map(|token| {
                KIND_WORDS
                    .iter()
                    .find(|(word, _)| *word == token)
                    .and_then(|(_, role)| role.map(str::to_string))
            })
    }

    /// (attribute, value) pairs the original element was identified by
    pub fn identifier_values(&self) -> Vec<(String, String)> {
        let mut values = Vec::new();
        if let Some(target) = self.target() {
            if let Some(id) = &target.id {
                values.push(("id".to_string(), id.clone()));
            }
            for (name, value) in &target.attributes {
                if !value.is_empty() && name != "role" && name != "type" {
                    values.push((name.clone(), value.clone()));
                }
            }
            for class in &target.classes {
                values.push(("class".to_string(), class.clone()));
            }
        }
        values
    }

    /// Text the selector explicitly names (`:has-text`, `text=`, aria-label, ...)
    pub fn explicit_text(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        let target = self.target()?;
        if let Some(text) = &target.text {
            return Some(text.clone());
        }
        target
            .attributes
            .iter()
            .find(|(k, v)| {
                !v.is_empty()
                    && matches!(k.as_str(), "aria-label" | "title" | "placeholder" | "alt" | "value")
            })
            .map(|(_, v)| v.clone())
    }

    /// Label phrase guessed from identifiers, e.g. `#submit-btn` -> "submit"
    pub fn derived_text(&self) -> Option<String> {
        let words: Vec<String> = self
            .identifier_values()
            .iter()
            .filter(|(name, _)| name != "class")
            .flat_map(|(_, value)| label_words(value))
            .collect();
        let mut unique: Vec<String> = Vec::new();
        for word in words {
            if !unique.contains(&word) {
                unique.push(word);
            }
        }
        if unique.is_empty() {
            None
        } else {
            Some(unique.join(" "))
        }
    }
}

/// Split an identifier into lowercase words, normalizing abbreviations.
/// Handles kebab, snake, dotted and camelCase forms.
pub fn tokenize(value: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            current.extend(ch.to_lowercase());
        } else {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .into_iter()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(short, _)| *short == word)
                .map(|(_, long)| long.to_string())
                .unwrap_or(word)
        })
        .collect()
}

/// Identifier words that read like a visible label (kind words and
/// numbers dropped)
pub fn label_words(value: &str) -> Vec<String> {
    tokenize(value)
        .into_iter()
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .filter(|word| !KIND_WORDS.iter().any(|(kind, _)| kind == word) || word == "submit")
        .collect()
}

/// ARIA role a tag carries without an explicit `role` attribute
pub fn implicit_role_for_tag(tag: &str) -> Option<&'static str> {
    let role = match tag {
        "button" => "button",
        "a" => "link",
        "select" => "combobox",
        "textarea" => "textbox",
        "img" => "img",
        "nav" => "navigation",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "li" => "listitem",
        "ul" | "ol" => "list",
        "table" => "table",
        "form" => "form",
        "dialog" => "dialog",
        "option" => "option",
        _ => return None,
    };
    Some(role)
}

static GET_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:page\.)?getBy(Role|Text|TestId|Label|Placeholder|AltText|Title)\((.*)\)\s*$")
        .expect("getBy pattern")
});

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'`]((?:[^"'`\\]|\\.)*)["'`]"#).expect("quoted pattern"));

static XPATH_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@([\w:-]+)\s*=\s*["']([^"']*)["']"#).expect("xpath attr pattern"));

static XPATH_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:text\(\)|normalize-space\(\s*(?:text\(\))?\s*\)|\.)\s*(?:=\s*|,\s*)["']([^"']*)["']"#)
        .expect("xpath text pattern")
});

static XPATH_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*(\d+)\s*\]").expect("xpath index pattern"));

fn strip_engine<'a>(selector: &'a str, engine: &str) -> Option<&'a str> {
    let rest = selector.strip_prefix(engine)?;
    rest.strip_prefix('=').map(str::trim)
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\'', '`'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].replace(&format!("\\{}", quote), &quote.to_string());
        }
    }
    value.to_string()
}

fn quoted_args(args: &str) -> Vec<String> {
    QUOTED
        .captures_iter(args)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn parse_get_by(hint: &mut SelectorHint, method: &str, args: &str) {
    let quoted = quoted_args(args);
    let first = quoted.first().cloned();
    let mut compound = Compound::default();
    match method {
        "Role" => {
            hint.role = first.map(|r| r.to_ascii_lowercase());
            hint.name = quoted.get(1).cloned();
        }
        "Text" => compound.text = first,
        "TestId" => {
            if let Some(id) = first {
                compound.attributes.push(("data-testid".into(), id));
            }
        }
        "Label" => {
            if let Some(label) = first {
                compound.attributes.push(("aria-label".into(), label));
            }
        }
        "Placeholder" => {
            if let Some(text) = first {
                compound.attributes.push(("placeholder".into(), text));
            }
        }
        "AltText" => {
            compound.tag = Some("img".into());
            if let Some(text) = first {
                compound.attributes.push(("alt".into(), text));
            }
        }
        "Title" => {
            if let Some(text) = first {
                compound.attributes.push(("title".into(), text));
            }
        }
        _ => {}
    }
    hint.compounds.push(compound);
}

fn parse_role_engine(hint: &mut SelectorHint, rest: &str) {
    let (role, predicates) = match rest.find('[') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    hint.role = Some(role.trim().to_ascii_lowercase());
    let compound = parse_compound(predicates);
    hint.name = compound
        .attributes
        .iter()
        .find(|(k, _)| k == "name")
        .map(|(_, v)| v.clone());
    hint.compounds.push(Compound::default());
}

/// Split on combinators at bracket/paren/quote depth zero.
/// Returns (compound, followed_by_child_combinator) pairs.
fn split_css(selector: &str) -> Vec<(String, bool)> {
    let mut parts: Vec<(String, bool)> = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    fn flush(current: &mut String, parts: &mut Vec<(String, bool)>) {
        if !current.trim().is_empty() {
            parts.push((current.trim().to_string(), false));
        }
        current.clear();
    }

    for ch in selector.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if depth == 0 => {
                flush(&mut current, &mut parts);
                if let Some(last) = parts.last_mut() {
                    last.1 = ch == '>';
                }
            }
            c if c.is_whitespace() && depth == 0 => {
                flush(&mut current, &mut parts);
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut parts);
    parts
}

fn parse_css(hint: &mut SelectorHint, selector: &str) {
    // Selector lists: the first alternative is as good as any.
    let first = selector.split(',').next().unwrap_or(selector);
    let parts = split_css(first);
    let mut all_child = true;
    for (i, (part, child_next)) in parts.iter().enumerate() {
        let compound = parse_compound(part);
        if !compound.is_empty() {
            hint.compounds.push(compound);
        }
        if i + 1 < parts.len() && !child_next {
            all_child = false;
        }
    }
    hint.anchored = all_child
        && hint
            .compounds
            .first()
            .and_then(|c| c.tag.as_deref())
            .map_or(false, |tag| tag == "html" || tag == "body");
}

fn parse_compound(part: &str) -> Compound {
    let mut compound = Compound::default();
    let chars: Vec<char> = part.chars().collect();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let mut ident = String::new();
        while *i < chars.len() {
            let c = chars[*i];
            if c == '\\' && *i + 1 < chars.len() {
                ident.push(chars[*i + 1]);
                *i += 2;
                continue;
            }
            if c.is_alphanumeric() || c == '-' || c == '_' {
                ident.push(c);
                *i += 1;
            } else {
                break;
            }
        }
        ident
    };

    let read_until = |i: &mut usize, close: char| -> String {
        let mut body = String::new();
        let mut depth = 0;
        let mut quote: Option<char> = None;
        while *i < chars.len() {
            let c = chars[*i];
            *i += 1;
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                body.push(c);
                continue;
            }
            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    body.push(c);
                }
                '(' | '[' => {
                    depth += 1;
                    body.push(c);
                }
                c if c == close && depth == 0 => return body,
                ')' | ']' => {
                    depth -= 1;
                    body.push(c);
                }
                _ => body.push(c),
            }
        }
        body
    };

    if i < chars.len() && (chars[i].is_alphabetic() || chars[i] == '*') {
        if chars[i] == '*' {
            i += 1;
        } else {
            compound.tag = Some(read_ident(&mut i).to_ascii_lowercase());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let id = read_ident(&mut i);
                if !id.is_empty() {
                    compound.id = Some(id);
                }
            }
            '.' => {
                i += 1;
                let class = read_ident(&mut i);
                if !class.is_empty() {
                    compound.classes.push(class);
                }
            }
            '[' => {
                i += 1;
                let body = read_until(&mut i, ']');
                if let Some((name, value)) = parse_attribute(&body) {
                    if name == "id" && compound.id.is_none() && !value.is_empty() {
                        compound.id = Some(value);
                    } else {
                        compound.attributes.push((name, value));
                    }
                }
            }
            ':' => {
                i += 1;
                if i < chars.len() && chars[i] == ':' {
                    i += 1;
                }
                let name = read_ident(&mut i).to_ascii_lowercase();
                let args = if i < chars.len() && chars[i] == '(' {
                    i += 1;
                    read_until(&mut i, ')')
                } else {
                    String::new()
                };
                match name.as_str() {
                    "nth-child" | "nth-of-type" => {
                        compound.nth = args.trim().parse().ok();
                    }
                    "first-child" | "first-of-type" | "first" => compound.nth = Some(1),
                    "has-text" | "text-is" | "text" | "contains" | "text-matches" => {
                        let text = unquote(&args);
                        if !text.is_empty() {
                            compound.text = Some(text);
                        }
                    }
                    _ => {}
                }
            }
            _ => i += 1,
        }
    }
    compound
}

fn parse_attribute(body: &str) -> Option<(String, String)> {
    let body = body.trim();
    let op_at = body.find(|c| matches!(c, '=' | '~' | '|' | '^' | '$' | '*'));
    match op_at {
        None => {
            let name = body.to_ascii_lowercase();
            (!name.is_empty()).then(|| (name, String::new()))
        }
        Some(idx) => {
            let name = body[..idx].trim().to_ascii_lowercase();
            let rest = body[idx..].trim_start_matches(|c| matches!(c, '=' | '~' | '|' | '^' | '$' | '*'));
            // Drop trailing case flag: [name="x" i]
            let rest = rest.trim();
            let rest = rest
                .strip_suffix(" i")
                .or_else(|| rest.strip_suffix(" s"))
                .unwrap_or(rest);
            (!name.is_empty()).then(|| (name, unquote(rest)))
        }
    }
}

fn parse_xpath(hint: &mut SelectorHint, xpath: &str) {
    let xpath = xpath.trim().trim_start_matches('(');
    let mut steps: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for ch in xpath.chars() {
        match ch {
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            '/' if depth <= 0 => {
                if !current.trim().is_empty() {
                    steps.push(std::mem::take(&mut current));
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        steps.push(current);
    }

    for step in steps {
        let step = step.trim();
        let (tag_part, predicates) = match step.find('[') {
            Some(idx) => (&step[..idx], &step[idx..]),
            None => (step, ""),
        };
        let tag_part = tag_part.rsplit("::").next().unwrap_or(tag_part).trim();
        let mut compound = Compound::default();
        if !tag_part.is_empty() && tag_part != "*" && tag_part != "." && tag_part != ".." {
            compound.tag = Some(tag_part.to_ascii_lowercase());
        }
        for caps in XPATH_ATTR.captures_iter(predicates) {
            let name = caps[1].to_ascii_lowercase();
            let value = caps[2].to_string();
            if name == "class" {
                compound.classes.extend(value.split_whitespace().map(str::to_string));
            } else if name == "id" {
                compound.id = Some(value);
            } else {
                compound.attributes.push((name, value));
            }
        }
        if let Some(caps) = XPATH_TEXT.captures(predicates) {
            compound.text = Some(caps[1].to_string());
        }
        if let Some(caps) = XPATH_INDEX.captures(predicates) {
            compound.nth = caps[1].parse().ok();
        }
        if !compound.is_empty() {
            hint.compounds.push(compound);
        }
    }
    hint.anchored = !xpath.starts_with("//")
        && hint
            .compounds
            .first()
            .and_then(|c| c.tag.as_deref())
            .map_or(false, |tag| tag == "html");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_identifier_styles() {
        assert_eq!(tokenize("submit-btn"), vec!["submit", "button"]);
        assert_eq!(tokenize("userEmailInput"), vec!["user", "email", "input"]);
        assert_eq!(tokenize("login_form.pwd"), vec!["login", "form", "password"]);
        assert_eq!(label_words("submit-btn"), vec!["submit"]);
        assert_eq!(label_words("email-field-2"), vec!["email"]);
    }

    #[test]
    fn test_parse_id_selector() {
        let hint = SelectorHint::parse("#submit-btn");
        assert_eq!(hint.target().unwrap().id.as_deref(), Some("submit-btn"));
        assert_eq!(hint.tag(), None);
        assert_eq!(hint.implied_role().as_deref(), Some("button"));
        assert_eq!(hint.implied_tag().as_deref(), Some("button"));
        assert_eq!(hint.derived_text().as_deref(), Some("submit"));
        assert_eq!(hint.explicit_text(), None);
    }

    #[test]
    fn test_parse_compound_with_attributes_and_pseudos() {
        let hint = SelectorHint::parse(
            r#"form#checkout > div.row:nth-of-type(2) button[data-testid="pay-now"]:has-text("Pay")"#,
        );
        assert_eq!(hint.compounds.len(), 3);
        let target = hint.target().unwrap();
        assert_eq!(target.tag.as_deref(), Some("button"));
        assert_eq!(
            target.attributes,
            vec![("data-testid".to_string(), "pay-now".to_string())]
        );
        assert_eq!(target.text.as_deref(), Some("Pay"));
        let ancestors = hint.ancestors();
        assert_eq!(ancestors[0].id.as_deref(), Some("checkout"));
        assert_eq!(ancestors[1].classes, vec!["row"]);
        assert_eq!(ancestors[1].nth, Some(2));
        assert!(!hint.anchored);
    }

    #[test]
    fn test_parse_anchored_child_path() {
        let hint = SelectorHint::parse("body > main > ul > li:nth-child(3) > a");
        assert!(hint.anchored);
        assert_eq!(hint.compounds.len(), 5);
        assert_eq!(hint.implied_role().as_deref(), Some("link"));
    }

    #[test]
    fn test_parse_xpath() {
        let hint = SelectorHint::parse(r#"//form[@id='login']//button[@type='submit' and text()='Sign in']"#);
        let target = hint.target().unwrap();
        assert_eq!(target.tag.as_deref(), Some("button"));
        assert_eq!(target.text.as_deref(), Some("Sign in"));
        assert_eq!(hint.ancestors()[0].id.as_deref(), Some("login"));

        let indexed = SelectorHint::parse("/html/body/div[2]/span");
        assert!(indexed.anchored);
        assert_eq!(indexed.compounds[2].nth, Some(2));
    }

    #[test]
    fn test_parse_playwright_engines() {
        let role = SelectorHint::parse(r#"role=button[name="Save changes"]"#);
        assert_eq!(role.role.as_deref(), Some("button"));
        assert_eq!(role.explicit_text().as_deref(), Some("Save changes"));

        let text = SelectorHint::parse("text=Checkout");
        assert_eq!(text.explicit_text().as_deref(), Some("Checkout"));

        let get_by = SelectorHint::parse("getByRole('link', { name: 'Docs' })");
        assert_eq!(get_by.role.as_deref(), Some("link"));
        assert_eq!(get_by.name.as_deref(), Some("Docs"));

        let test_id = SelectorHint::parse("page.getByTestId('cart-icon')");
        assert_eq!(
            test_id.identifier_values(),
            vec![("data-testid".to_string(), "cart-icon".to_string())]
        );

        let chained = SelectorHint::parse("#sidebar >> text=Settings");
        assert_eq!(chained.explicit_text().as_deref(), Some("Settings"));
    }

    #[test]
    fn test_garbage_selectors_do_not_panic() {
        for raw in ["", "   ", "[[[", "::(", "#", "//", "role=", ">>", "a[b='c", "(((", "\\"] {
            let _ = SelectorHint::parse(raw);
        }
    }
}
