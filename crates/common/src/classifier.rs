//! Failure classification
//!
//! Classification is two-phase: first every raw input (error text, network
//! log, console output, DOM) is reduced to a set of boolean [`Signals`];
//! then [`DECISION_ORDER`] is walked and the first category whose predicate
//! holds wins. Narrow, non-UI root causes (auth, network, application bugs)
//! sit ahead of the selector and timing buckets so they never trigger
//! selector healing.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::dom::DomSnapshot;
use crate::locator::SelectorHint;
use crate::types::{ClassificationReport, FailureCategory, FailureRecord, HealingConfig, NetworkLogEntry};

static AUTH_TEXT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\b(?:status(?:\s*code)?|response code|http(?:/[\d.]+)?)(?:\s+of)?\s*[:=]?\s*40[13]\b",
        r"(?i)unauthori[sz]ed",
        r"(?i)\bforbidden\b",
        r"(?i)session (has )?(expired|timed? ?out|invalid)",
        r"(?i)(login|log in|sign in|signin|authentication) (is )?required",
        r"(?i)not (authenticated|logged in|authorized)",
        r"(?i)(token|jwt|credentials?|cookie) (has |is )?(expired|invalid|missing)",
        r"(?i)invalid (token|credentials|session)",
        r"(?i)authentication failed",
        r"(?i)redirected to [^\s]*(login|signin|sign-in|auth)",
    ])
    .expect("auth patterns")
});

static NETWORK_TEXT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)net::err_",
        r"(?i)\b(econnrefused|econnreset|enotfound|etimedout|eai_again|ehostunreach)\b",
        r"(?i)cors policy",
        r"(?i)cross-origin request blocked",
        r"(?i)failed to fetch",
        r"(?i)networkerror",
        r"(?i)network (error|request failed)",
        r"(?i)connection (refused|reset|closed|aborted)",
        r"(?i)socket hang up",
        r"(?i)ssl (handshake|error)",
    ])
    .expect("network patterns")
});

static APP_BUG_CONSOLE: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\buncaught\b",
        r"(?i)unhandled (promise )?rejection",
        r"(?i)\b(type|reference|syntax|range|internal|eval)error\b",
        r"(?i)is not a function",
        r"(?i)is not defined",
        r"(?i)cannot read propert(y|ies) of (undefined|null)",
        r"(?i)maximum call stack",
        r"(?i)chunkloaderror",
        r"(?i)hydration (failed|error|mismatch)",
        r"(?i)minified react error",
        r"(?i)status of 5\d\d",
    ])
    .expect("console patterns")
});

/// Server error pages or banners rendered into the page
static IN_PAGE_SERVER_ERROR: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^\s*(?:http\s*)?5\d\d\s*(?:[-:|.]\s*)?(?:internal|server|bad gateway|service|gateway|error\b)",
        r"(?i)^\s*error\s*:?\s*5\d\d\s*$",
        r"(?i)internal server error",
        r"(?i)bad gateway",
        r"(?i)service (temporarily )?unavailable",
        r"(?i)gateway time-?out",
        r"(?i)application error: a (client|server)-side exception",
    ])
    .expect("in-page error patterns")
});

static LOCATE_TEXT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)element (was )?not found",
        r"(?i)no such element",
        r"(?i)nosuchelement",
        r"(?i)unable to (locate|find) (the )?element",
        r"(?i)could not (find|locate) (the )?element",
        r"(?i)failed to find element",
        r"(?i)waiting for (selector|locator|getby)",
        r"(?i)expected to find element",
        r"(?i)resolved to 0 elements",
        r"(?i)no elements? (found|matching)",
        r"(?i)element .{0,60}not found",
    ])
    .expect("locate patterns")
});

static STALE_TEXT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)stale element",
        r"(?i)staleelementreference",
        r"(?i)detached from (the )?(document|dom)",
        r"(?i)element is not attached",
        r"(?i)element (is|was|has been) detached",
        r"(?i)node is detached",
        r"(?i)no longer attached",
    ])
    .expect("stale patterns")
});

static TIMING_TEXT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)time(d)?[ -]?out",
        r"(?i)\bexceeded\b",
        r"(?i)wait(ing)? .{0,30}(expired|elapsed)",
        r"(?i)deadline",
        r"(?i)took too long",
    ])
    .expect("timing patterns")
});

const QUOTED: &str = r#"(?:"([^"]+)"|'([^']+)'|`([^`]+)`)"#;

static SELECTOR_IN_ERROR: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i)\blocator\(\s*{}", QUOTED),
        format!(r"(?i)waiting for (?:selector|locator)\s*\(?\s*{}", QUOTED),
        format!(r#"(?i)"selector"\s*:\s*{}"#, QUOTED),
        format!(r"(?i)(?:find|locate) element:?\s*{}", QUOTED),
        format!(r"(?i)(?:selector|element)\s*{}\s*(?:not found|was not found|did not match)", QUOTED),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("selector extraction pattern"))
    .chain(std::iter::once(
        Regex::new(r"\b((?:page\.)?getBy[A-Z]\w*\([^)]*\))").expect("getBy extraction pattern"),
    ))
    .collect()
});

/// Pull the failing selector out of runner error text
pub fn extract_selector(error_message: &str) -> Option<String> {
    SELECTOR_IN_ERROR.iter().find_map(|pattern| {
        let caps = pattern.captures(error_message)?;
        (1..caps.len())
            .find_map(|i| caps.get(i))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Raw inputs for one classification
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierInput<'a> {
    pub error_message: &'a str,
    pub dom: &'a str,
    pub console_errors: &'a [String],
    pub network_logs: &'a [NetworkLogEntry],
    pub selector: Option<&'a str>,
}

impl<'a> ClassifierInput<'a> {
    pub fn new(
        error_message: &'a str,
        dom: &'a str,
        console_errors: &'a [String],
        network_logs: &'a [NetworkLogEntry],
    ) -> Self {
        Self {
            error_message,
            dom,
            console_errors,
            network_logs,
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: Option<&'a str>) -> Self {
        self.selector = selector.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn from_record(record: &'a FailureRecord) -> Self {
        Self::new(
            &record.error_message,
            &record.dom_snapshot,
            &record.console_errors,
            &record.network_logs,
        )
        .with_selector(record.selector.as_deref())
    }
}

/// Facts extracted from the inputs before any decision is made
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub auth: bool,
    pub network: bool,
    pub application_error: bool,
    pub locate_failure: bool,
    pub has_selector: bool,
    pub stale: bool,
    pub element_type_missing: bool,
    pub timeout: bool,
}

fn auth_rule(s: &Signals) -> bool {
    s.auth
}

fn network_rule(s: &Signals) -> bool {
    s.network
}

fn application_bug_rule(s: &Signals) -> bool {
    s.application_error
}

fn selector_rule(s: &Signals) -> bool {
    s.locate_failure && s.has_selector
}

fn dom_change_rule(s: &Signals) -> bool {
    s.stale || s.element_type_missing
}

fn timing_rule(s: &Signals) -> bool {
    s.timeout
}

/// Categories in priority order; the first matching rule wins and
/// `Unknown` is the fallback.
pub const DECISION_ORDER: &[(FailureCategory, fn(&Signals) -> bool)] = &[
    (FailureCategory::AuthIssue, auth_rule),
    (FailureCategory::NetworkIssue, network_rule),
    (FailureCategory::ApplicationBug, application_bug_rule),
    (FailureCategory::SelectorIssue, selector_rule),
    (FailureCategory::DomChange, dom_change_rule),
    (FailureCategory::TimingIssue, timing_rule),
];

/// Operator-facing description and remediation for each category
const GUIDE: &[(FailureCategory, &str, &[&str])] = &[
    (
        FailureCategory::SelectorIssue,
        "The element locator no longer matches anything on the page.",
        &[
            "Review the proposed healed selector before adopting it",
            "Prefer stable attributes such as data-testid over ids and classes",
            "Update the page object or test to use the new selector",
        ],
    ),
    (
        FailureCategory::TimingIssue,
        "The test gave up waiting before the page reached the expected state.",
        &[
            "Wait for a specific condition instead of a fixed delay",
            "Check for slow API responses or animations on the page",
            "Raise the timeout only if the slowness is expected",
        ],
    ),
    (
        FailureCategory::NetworkIssue,
        "Requests failed at the transport level or the backend returned a server error.",
        &[
            "Check that backend services in the test environment are healthy",
            "Inspect failed requests in the network log",
            "Review CORS and proxy configuration",
        ],
    ),
    (
        FailureCategory::AuthIssue,
        "The session was rejected or redirected to login.",
        &[
            "Verify test credentials and their permissions",
            "Refresh stored session state or tokens before the run",
            "Check for session expiry during long tests",
        ],
    ),
    (
        FailureCategory::DomChange,
        "The page structure changed under the test: the element was detached or its type no longer exists.",
        &[
            "Re-query elements after navigation or re-render instead of caching handles",
            "Compare the DOM snapshot with the last passing run",
            "Confirm the UI change was intended and update the test",
        ],
    ),
    (
        FailureCategory::ApplicationBug,
        "The application threw an error or rendered a server error page.",
        &[
            "File a product bug with the console output and screenshot",
            "Reproduce the failure manually",
            "Do not heal the test until the bug is fixed",
        ],
    ),
    (
        FailureCategory::Unknown,
        "No known failure pattern matched.",
        &[
            "Inspect the error message, screenshot and logs manually",
            "Add a classification rule if this failure recurs",
        ],
    ),
];

/// Description and recommended actions for a category
pub fn describe(category: FailureCategory) -> (&'static str, &'static [&'static str]) {
    GUIDE
        .iter()
        .find(|(c, _, _)| *c == category)
        .map(|(_, description, actions)| (*description, *actions))
        .unwrap_or(("No known failure pattern matched.", &[][..]))
}

/// Pure, total failure classifier
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    max_dom_bytes: usize,
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::new(HealingConfig::default().max_dom_bytes)
    }
}

impl FailureClassifier {
    /// DOM snapshots above `max_dom_bytes` contribute no DOM signals.
    pub fn new(max_dom_bytes: usize) -> Self {
        Self { max_dom_bytes }
    }

    pub fn from_config(config: &HealingConfig) -> Self {
        Self::new(config.max_dom_bytes)
    }

    pub fn signals(&self, input: &ClassifierInput<'_>) -> Signals {
        let error = input.error_message;
        let selector = input
            .selector
            .map(str::to_string)
            .or_else(|| extract_selector(error));

        let unquoted = match selector.as_deref() {
            Some(s) if error.contains(s) => error.replace(s, " "),
            _ => error.to_string(),
        };

        let mut signals = Signals {
            auth: AUTH_TEXT.is_match(&unquoted),
            network: NETWORK_TEXT.is_match(error),
            application_error: false,
            locate_failure: LOCATE_TEXT.is_match(error),
            has_selector: selector.is_some(),
            stale: STALE_TEXT.is_match(error),
            element_type_missing: false,
            timeout: TIMING_TEXT.is_match(error),
        };

        for entry in input.network_logs {
            match entry {
                NetworkLogEntry::Response {
                    status_code,
                    redirect_location,
                    ..
                } => match status_code {
                    401 | 403 => signals.auth = true,
                    300..=399 => {
                        if redirect_location
                            .as_deref()
                            .map_or(false, |location| AUTH_REDIRECT.is_match(location))
                        {
                            signals.auth = true;
                        }
                    }
                    500..=599 => signals.network = true,
                    _ => {}
                },
                NetworkLogEntry::Failure { error_text, .. } => {
                    if AUTH_TEXT.is_match(error_text) {
                        signals.auth = true;
                    } else {
                        signals.network = true;
                    }
                }
                NetworkLogEntry::Opaque(_) => {}
            }
        }

        for line in input.console_errors {
            if NETWORK_TEXT.is_match(line) {
                signals.network = true;
            }
            if APP_BUG_CONSOLE.is_match(line) {
                signals.application_error = true;
            }
        }

        if !input.dom.trim().is_empty() && input.dom.len() <= self.max_dom_bytes {
            let snapshot = DomSnapshot::parse(input.dom);
            if snapshot
                .elements()
                .iter()
                .any(|e| IN_PAGE_SERVER_ERROR.is_match(&e.own_text))
            {
                signals.application_error = true;
            }
            if let Some(tag) = selector.as_deref().and_then(|s| {
                SelectorHint::parse(s).tag().map(str::to_string)
            }) {
                signals.element_type_missing = !snapshot.is_empty() && !snapshot.has_tag(&tag);
            }
        }

        signals
    }

    pub fn classify(&self, input: &ClassifierInput<'_>) -> FailureCategory {
        decide(&self.signals(input))
    }

    /// Category plus the fixed description and remediation table entry
    pub fn report(&self, input: &ClassifierInput<'_>) -> ClassificationReport {
        let failure_type = self.classify(input);
        let (description, actions) = describe(failure_type);
        ClassificationReport {
            failure_type,
            description: description.to_string(),
            recommended_actions: actions.iter().map(|a| a.to_string()).collect(),
            selector: input
                .selector
                .map(str::to_string)
                .or_else(|| extract_selector(input.error_message)),
        }
    }
}

static AUTH_REDIRECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(login|signin|sign-in|sso|oauth|auth)").expect("redirect pattern"));

/// Walk [`DECISION_ORDER`]
pub fn decide(signals: &Signals) -> FailureCategory {
    DECISION_ORDER
        .iter()
        .find(|(_, rule)| rule(signals))
        .map(|(category, _)| *category)
        .unwrap_or(FailureCategory::Unknown)
}

/// Classify with the default classifier
pub fn classify(
    error_message: &str,
    dom: &str,
    console_errors: &[String],
    network_logs: &[NetworkLogEntry],
) -> FailureCategory {
    FailureClassifier::default().classify(&ClassifierInput::new(
        error_message,
        dom,
        console_errors,
        network_logs,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SUBMIT_PAGE: &str =
        r#"<html><body><form><button data-testid="submit-button">Submit</button></form></body></html>"#;

    fn classify_error(error: &str) -> FailureCategory {
        classify(error, "", &[], &[])
    }

    #[test_case("Timeout 30000ms exceeded waiting for selector \"#submit-btn\"" => FailureCategory::SelectorIssue ; "playwright selector timeout")]
    #[test_case("no such element: Unable to locate element: {\"method\":\"css selector\",\"selector\":\"#login\"}" => FailureCategory::SelectorIssue ; "selenium no such element")]
    #[test_case("Timed out retrying after 4000ms: Expected to find element: `.cart`, but never found it." => FailureCategory::SelectorIssue ; "cypress expected to find")]
    #[test_case("401 Unauthorized" => FailureCategory::AuthIssue ; "status text")]
    #[test_case("Request failed with status 401" => FailureCategory::AuthIssue ; "status code in message")]
    #[test_case("Failed to load resource: the server responded with a status of 403 ()" => FailureCategory::AuthIssue ; "console style status")]
    #[test_case("Timeout 30000ms exceeded waiting for selector \"#order-row-401\"" => FailureCategory::SelectorIssue ; "status digits inside selector")]
    #[test_case("waiting for locator('a[href=\"/errors/403\"]')" => FailureCategory::SelectorIssue ; "status digits inside href")]
    #[test_case("Session expired, please sign in again" => FailureCategory::AuthIssue ; "session expiry")]
    #[test_case("page.goto: net::ERR_CONNECTION_REFUSED at http://localhost:3000/" => FailureCategory::NetworkIssue ; "connection refused")]
    #[test_case("stale element reference: element is not attached to the page document" => FailureCategory::DomChange ; "selenium stale")]
    #[test_case("Element is detached from document" => FailureCategory::DomChange ; "detached")]
    #[test_case("Timeout 5000ms exceeded." => FailureCategory::TimingIssue ; "bare timeout")]
    #[test_case("expected 3 to equal 4" => FailureCategory::Unknown ; "assertion")]
    #[test_case("" => FailureCategory::Unknown ; "empty")]
    fn test_error_text_categories(error: &str) -> FailureCategory {
        classify_error(error)
    }

    #[test]
    fn test_selector_issue_needs_a_selector() {
        assert_eq!(classify_error("Element not found"), FailureCategory::Unknown);
        let input = ClassifierInput::new("Element not found", "", &[], &[]).with_selector(Some("#x"));
        assert_eq!(
            FailureClassifier::default().classify(&input),
            FailureCategory::SelectorIssue
        );
    }

    #[test]
    fn test_auth_short_circuits_selector_analysis() {
        let logs = vec![NetworkLogEntry::response(401, "https://app.test/api/me")];
        let category = classify(
            "401 Unauthorized waiting for selector \"#submit-btn\"",
            SUBMIT_PAGE,
            &[],
            &logs,
        );
        assert_eq!(category, FailureCategory::AuthIssue);
    }

    #[test]
    fn test_network_log_signals() {
        let server_error = vec![NetworkLogEntry::response(502, "https://app.test/api")];
        assert_eq!(
            classify("waiting for selector \"#a\"", "", &[], &server_error),
            FailureCategory::NetworkIssue
        );

        let transport = vec![NetworkLogEntry::failure("net::ERR_FAILED", "https://cdn.test/app.js")];
        assert_eq!(classify("", "", &[], &transport), FailureCategory::NetworkIssue);

        let login_redirect: Vec<NetworkLogEntry> = serde_json::from_str(
            r#"[{"statusCode": 302, "url": "https://app.test/", "redirectLocation": "/login?next=/"}]"#,
        )
        .unwrap();
        assert_eq!(classify("", "", &[], &login_redirect), FailureCategory::AuthIssue);

        let opaque: Vec<NetworkLogEntry> =
            serde_json::from_str(r#"[{"type": "websocket", "frames": 3}]"#).unwrap();
        assert!(matches!(opaque[0], NetworkLogEntry::Opaque(_)));
        assert_eq!(classify("", "", &[], &opaque), FailureCategory::Unknown);
    }

    #[test]
    fn test_application_bug_from_console_and_page() {
        let console = vec!["Uncaught TypeError: Cannot read properties of undefined (reading 'id')".to_string()];
        assert_eq!(
            classify("waiting for selector \"#a\"", "", &console, &[]),
            FailureCategory::ApplicationBug
        );

        let error_page = "<html><body><h1>500 Internal Server Error</h1></body></html>";
        assert_eq!(
            classify("Timeout 3000ms exceeded", error_page, &[], &[]),
            FailureCategory::ApplicationBug
        );
    }

    #[test]
    fn test_selector_with_status_digits_is_healable() {
        let page = r#"<table><tr id="order-row-402"><td>Order 402</td></tr></table>"#;
        let category = classify(
            "Timeout 30000ms exceeded waiting for selector \"#order-row-401\"",
            page,
            &[],
            &[],
        );
        assert_eq!(category, FailureCategory::SelectorIssue);
    }

    #[test_case("<h1>500 Internal Server Error</h1>" => FailureCategory::ApplicationBug ; "error heading")]
    #[test_case("<h1>503 Service Unavailable</h1>" => FailureCategory::ApplicationBug ; "unavailable heading")]
    #[test_case("<div class=\"banner\">HTTP 500 - server error</div>" => FailureCategory::ApplicationBug ; "error banner")]
    #[test_case("<h2>Error 502</h2>" => FailureCategory::ApplicationBug ; "bare error code")]
    #[test_case("<p>Showing 500 results with no errors</p>" => FailureCategory::SelectorIssue ; "result count copy")]
    #[test_case("<p>Up to 500 items per page, 502 in stock, no timeout</p>" => FailureCategory::SelectorIssue ; "numbers in prose")]
    fn test_in_page_server_error(body: &str) -> FailureCategory {
        let page = format!("<html><body>{}<div id=\"results\"></div></body></html>", body);
        classify(
            "Timeout 30000ms exceeded waiting for selector \"#results-table\"",
            &page,
            &[],
            &[],
        )
    }

    #[test]
    fn test_dom_change_when_element_type_missing() {
        let input = ClassifierInput::new("Timeout 3000ms exceeded", SUBMIT_PAGE, &[], &[])
            .with_selector(Some("table.results tr"));
        assert_eq!(
            FailureClassifier::default().classify(&input),
            FailureCategory::DomChange
        );

        let present = ClassifierInput::new("Timeout 3000ms exceeded", SUBMIT_PAGE, &[], &[])
            .with_selector(Some("button.primary"));
        assert_eq!(
            FailureClassifier::default().classify(&present),
            FailureCategory::TimingIssue
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let console = vec!["warning: deprecated".to_string()];
        let first = classify("Timeout 30000ms exceeded", SUBMIT_PAGE, &console, &[]);
        for _ in 0..10 {
            assert_eq!(classify("Timeout 30000ms exceeded", SUBMIT_PAGE, &console, &[]), first);
        }
    }

    #[test_case("Timeout 30000ms exceeded waiting for selector \"#submit-btn\"" => Some("#submit-btn".to_string()) ; "quoted selector")]
    #[test_case("waiting for locator('[data-testid=\"cart\"]')" => Some("[data-testid=\"cart\"]".to_string()) ; "locator call")]
    #[test_case("Unable to locate element: {\"method\":\"css selector\",\"selector\":\"#login\"}" => Some("#login".to_string()) ; "selenium json")]
    #[test_case("waiting for getByRole('button', { name: 'Save' }) to be visible" => Some("getByRole('button', { name: 'Save' })".to_string()) ; "get by role")]
    #[test_case("Timeout 5000ms exceeded." => None ; "no selector")]
    fn test_extract_selector(error: &str) -> Option<String> {
        extract_selector(error)
    }

    #[test]
    fn test_report_uses_fixed_table() {
        let input = ClassifierInput::new("Timeout 30000ms exceeded waiting for selector \"#submit-btn\"", "", &[], &[]);
        let report = FailureClassifier::default().report(&input);
        assert_eq!(report.failure_type, FailureCategory::SelectorIssue);
        assert_eq!(report.selector.as_deref(), Some("#submit-btn"));
        let (description, actions) = describe(FailureCategory::SelectorIssue);
        assert_eq!(report.description, description);
        assert_eq!(report.recommended_actions.len(), actions.len());

        for category in FailureCategory::ALL {
            let (description, actions) = describe(category);
            assert!(!description.is_empty());
            assert!(!actions.is_empty());
        }
    }
}
