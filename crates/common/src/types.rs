//! Core types for testmend

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Queue lifecycle state of a failure record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealingStatus {
    Pending,
    Analyzing,
    Healed,
    Failed,
    BugConfirmed,
}

impl Default for HealingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl HealingStatus {
    pub const ALL: [HealingStatus; 5] = [
        HealingStatus::Pending,
        HealingStatus::Analyzing,
        HealingStatus::Healed,
        HealingStatus::Failed,
        HealingStatus::BugConfirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealingStatus::Pending => "pending",
            HealingStatus::Analyzing => "analyzing",
            HealingStatus::Healed => "healed",
            HealingStatus::Failed => "failed",
            HealingStatus::BugConfirmed => "bug_confirmed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HealingStatus::Healed | HealingStatus::Failed | HealingStatus::BugConfirmed
        )
    }

    /// Edges the worker state machine may take. Operator updates bypass this.
    pub fn can_transition_to(&self, next: HealingStatus) -> bool {
        use HealingStatus::*;
        matches!(
            (self, next),
            (Pending, Analyzing)
                | (Analyzing, Pending)
                | (Analyzing, Healed)
                | (Analyzing, Failed)
                | (Analyzing, BugConfirmed)
        )
    }
}

impl std::fmt::Display for HealingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HealingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HealingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown status '{}'", s)))
    }
}

/// Root-cause bucket assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    AuthIssue,
    NetworkIssue,
    ApplicationBug,
    SelectorIssue,
    DomChange,
    TimingIssue,
    Unknown,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 7] = [
        FailureCategory::AuthIssue,
        FailureCategory::NetworkIssue,
        FailureCategory::ApplicationBug,
        FailureCategory::SelectorIssue,
        FailureCategory::DomChange,
        FailureCategory::TimingIssue,
        FailureCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::AuthIssue => "AUTH_ISSUE",
            FailureCategory::NetworkIssue => "NETWORK_ISSUE",
            FailureCategory::ApplicationBug => "APPLICATION_BUG",
            FailureCategory::SelectorIssue => "SELECTOR_ISSUE",
            FailureCategory::DomChange => "DOM_CHANGE",
            FailureCategory::TimingIssue => "TIMING_ISSUE",
            FailureCategory::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailureCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        FailureCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == upper)
            .ok_or_else(|| Error::Validation(format!("unknown failure type '{}'", s)))
    }
}

/// Where an adopted healed selector came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealSource {
    Cache,
    Generator,
    Manual,
}

impl HealSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealSource::Cache => "cache",
            HealSource::Generator => "generator",
            HealSource::Manual => "manual",
        }
    }
}

impl std::str::FromStr for HealSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cache" => Ok(HealSource::Cache),
            "generator" => Ok(HealSource::Generator),
            "manual" => Ok(HealSource::Manual),
            other => Err(Error::Validation(format!("unknown heal source '{}'", other))),
        }
    }
}

/// Why a record ended in `failed`. Keeps algorithmic non-results apart
/// from infrastructure trouble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NonSelectorCategory,
    NoViableCandidate,
    InfrastructureError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NonSelectorCategory => "non_selector_category",
            FailureReason::NoViableCandidate => "no_viable_candidate",
            FailureReason::InfrastructureError => "infrastructure_error",
        }
    }
}

impl std::str::FromStr for FailureReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "non_selector_category" => Ok(FailureReason::NonSelectorCategory),
            "no_viable_candidate" => Ok(FailureReason::NoViableCandidate),
            "infrastructure_error" => Ok(FailureReason::InfrastructureError),
            other => Err(Error::Validation(format!("unknown failure reason '{}'", other))),
        }
    }
}

/// One captured network event. Runner payloads are loosely shaped, so
/// anything that is neither a response nor a transport failure is kept
/// verbatim as `Opaque`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkLogEntry {
    Response {
        #[serde(alias = "statusCode", alias = "status")]
        status_code: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(
            default,
            alias = "redirectLocation",
            alias = "location",
            skip_serializing_if = "Option::is_none"
        )]
        redirect_location: Option<String>,
    },
    Failure {
        #[serde(alias = "errorText", alias = "error", alias = "failure")]
        error_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Opaque(serde_json::Value),
}

impl NetworkLogEntry {
    pub fn response(status_code: u16, url: impl Into<String>) -> Self {
        NetworkLogEntry::Response {
            status_code,
            url: Some(url.into()),
            method: None,
            redirect_location: None,
        }
    }

    pub fn failure(error_text: impl Into<String>, url: impl Into<String>) -> Self {
        NetworkLogEntry::Failure {
            error_text: error_text.into(),
            url: Some(url.into()),
        }
    }
}

/// A reported test failure tracked through the healing lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: String,
    pub test_id: String,
    pub test_name: String,
    pub test_type: String,
    pub error_message: String,
    pub dom_snapshot: String,
    #[serde(default, with = "screenshot_base64")]
    pub screenshot: Vec<u8>,
    #[serde(default)]
    pub console_errors: Vec<String>,
    #[serde(default)]
    pub network_logs: Vec<NetworkLogEntry>,
    pub url: String,
    pub selector: Option<String>,
    pub failure_type: Option<FailureCategory>,
    pub status: HealingStatus,
    pub healed_selector: Option<String>,
    pub confidence_score: Option<f64>,
    pub heal_source: Option<HealSource>,
    pub failure_reason: Option<FailureReason>,
    pub last_error: Option<String>,
    pub healing_attempts: u32,
    /// Consecutive transient analysis failures; reset by any completed pass.
    pub transient_failures: u32,
    /// Bumped on every write; used for optimistic concurrency.
    pub generation: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn from_new(failure: NewFailure, default_test_type: &str) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            test_id: failure.test_id,
            test_name: failure.test_name,
            test_type: failure
                .test_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| default_test_type.to_string()),
            error_message: failure.error.message,
            dom_snapshot: failure.context.dom,
            screenshot: failure.context.screenshot,
            console_errors: failure.context.console_errors,
            network_logs: failure.context.network_logs,
            url: failure.context.url,
            selector: failure.context.selector.filter(|s| !s.trim().is_empty()),
            failure_type: None,
            status: HealingStatus::Pending,
            healed_selector: None,
            confidence_score: None,
            heal_source: None,
            failure_reason: None,
            last_error: None,
            healing_attempts: 0,
            transient_failures: 0,
            generation: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
        self.generation += 1;
    }

    /// Checks the pairing invariants that every persisted record must hold.
    pub fn check_invariants(&self) -> Result<()> {
        match (&self.healed_selector, self.confidence_score) {
            (Some(_), Some(score)) => check_confidence(score)?,
            (None, None) => {}
            _ => {
                return Err(Error::Validation(
                    "healed_selector and confidence_score must be set together".into(),
                ))
            }
        }
        let healed = self.status == HealingStatus::Healed;
        if healed != self.healed_selector.is_some() {
            return Err(Error::Validation(format!(
                "healed_selector must be present exactly when status is healed (status: {})",
                self.status
            )));
        }
        Ok(())
    }
}

/// Error half of an enqueue request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureError {
    pub message: String,
}

/// Page context captured alongside a failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureContext {
    #[serde(default)]
    pub dom: String,
    #[serde(default, with = "screenshot_base64")]
    pub screenshot: Vec<u8>,
    #[serde(default, alias = "console_errors")]
    pub console_errors: Vec<String>,
    #[serde(default, alias = "network_logs")]
    pub network_logs: Vec<NetworkLogEntry>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub selector: Option<String>,
}

/// Enqueue request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFailure {
    #[serde(alias = "test_id")]
    pub test_id: String,
    #[serde(alias = "test_name")]
    pub test_name: String,
    #[serde(default, alias = "test_type")]
    pub test_type: Option<String>,
    pub error: FailureError,
    #[serde(default)]
    pub context: FailureContext,
}

impl NewFailure {
    pub fn validate(&self) -> Result<()> {
        if self.test_id.trim().is_empty() {
            return Err(Error::Validation("testId cannot be empty".into()));
        }
        if self.test_name.trim().is_empty() {
            return Err(Error::Validation("testName cannot be empty".into()));
        }
        Ok(())
    }
}

/// Operator correction applied through `HealingQueue::update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub status: Option<HealingStatus>,
    pub healed_selector: Option<String>,
    pub confidence_score: Option<f64>,
    pub healing_attempts: Option<u32>,
    /// Reject the update unless the record is still in this status.
    pub expected_status: Option<HealingStatus>,
    /// Reject the update unless the record is still at this generation.
    pub expected_generation: Option<i64>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.healed_selector.is_none()
            && self.confidence_score.is_none()
            && self.healing_attempts.is_none()
    }
}

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 100;

/// Filter and page window for listing records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub status: Option<HealingStatus>,
    pub failure_type: Option<FailureCategory>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            status: None,
            failure_type: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl RecordFilter {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_LIST_LIMIT {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {} (got {})",
                MAX_LIST_LIMIT, self.limit
            )));
        }
        Ok(())
    }

    pub fn matches(&self, record: &FailureRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self
                .failure_type
                .map_or(true, |t| record.failure_type == Some(t))
    }
}

/// Composite cache key. Exact match, case-sensitive; an absent page URL is
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternKey {
    pub test_type: String,
    pub original_selector: String,
    pub page_url: String,
}

impl PatternKey {
    pub fn new(
        test_type: impl Into<String>,
        original_selector: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            test_type: test_type.into(),
            original_selector: original_selector.into(),
            page_url: page_url.into(),
        }
    }
}

impl std::fmt::Display for PatternKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}@{}",
            self.test_type, self.original_selector, self.page_url
        )
    }
}

/// A previously successful selector repair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingPattern {
    pub id: String,
    #[serde(flatten)]
    pub key: PatternKey,
    pub healed_selector: String,
    pub confidence_score: f64,
    pub dom_context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub use_count: u64,
}

/// Store request for the pattern cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPattern {
    #[serde(flatten)]
    pub key: PatternKey,
    pub healed_selector: String,
    pub confidence_score: f64,
    pub dom_context: Option<String>,
}

impl NewPattern {
    pub fn validate(&self) -> Result<()> {
        if self.key.test_type.trim().is_empty() {
            return Err(Error::Validation("testType cannot be empty".into()));
        }
        if self.key.original_selector.trim().is_empty() {
            return Err(Error::Validation("originalSelector cannot be empty".into()));
        }
        if self.healed_selector.trim().is_empty() {
            return Err(Error::Validation("healedSelector cannot be empty".into()));
        }
        check_confidence(self.confidence_score)
    }

    pub fn into_pattern(self) -> HealingPattern {
        let now = now();
        HealingPattern {
            id: Uuid::new_v4().to_string(),
            key: self.key,
            healed_selector: self.healed_selector,
            confidence_score: self.confidence_score,
            dom_context: self.dom_context,
            created_at: now,
            updated_at: now,
            last_used_at: now,
            use_count: 1,
        }
    }
}

/// Heuristic that produced a selector candidate, in merge priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Attribute,
    Aria,
    TextContent,
    Structural,
}

impl Strategy {
    /// Lower wins when confidences tie.
    pub fn priority(&self) -> u8 {
        match self {
            Strategy::Attribute => 0,
            Strategy::Aria => 1,
            Strategy::TextContent => 2,
            Strategy::Structural => 3,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Attribute => write!(f, "attribute"),
            Strategy::Aria => write!(f, "aria"),
            Strategy::TextContent => write!(f, "text"),
            Strategy::Structural => write!(f, "structural"),
        }
    }
}

/// Proposed replacement selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorCandidate {
    pub selector: String,
    pub strategy: Strategy,
    pub confidence_score: f64,
    pub rationale: String,
}

/// Tunables for the analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealingConfig {
    /// Minimum confidence for adopting a cached or generated selector
    pub confidence_floor: f64,
    /// Candidates requested from the generator per pass
    pub max_candidates: usize,
    /// Test type used for cache keys when a failure does not name one
    pub default_test_type: String,
    /// DOM snapshots larger than this yield no candidates
    pub max_dom_bytes: usize,
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
            max_candidates: 5,
            default_test_type: "e2e".to_string(),
            max_dom_bytes: 5 * 1024 * 1024,
        }
    }
}

impl HealingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(Error::InvalidConfig(format!(
                "confidence_floor must be within [0, 1] (got {})",
                self.confidence_floor
            )));
        }
        if self.max_candidates == 0 {
            return Err(Error::InvalidConfig("max_candidates must be at least 1".into()));
        }
        if self.default_test_type.trim().is_empty() {
            return Err(Error::InvalidConfig("default_test_type cannot be empty".into()));
        }
        Ok(())
    }
}

/// Aggregate view of the queue, recomputed on demand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: u64,
    pub by_status: Vec<(HealingStatus, u64)>,
    pub by_failure_type: Vec<(FailureCategory, u64)>,
    /// healed / (healed + failed + bug_confirmed); 0 when nothing finished
    pub heal_success_rate: f64,
}

/// Classifier output for operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub failure_type: FailureCategory,
    pub description: String,
    pub recommended_actions: Vec<String>,
    pub selector: Option<String>,
}

/// Current time at the millisecond precision the stores persist
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn check_confidence(score: f64) -> Result<()> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "confidence score must be within [0, 1] (got {})",
            score
        )))
    }
}

mod screenshot_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in HealingStatus::ALL {
            assert_eq!(status.as_str().parse::<HealingStatus>().unwrap(), status);
        }
        assert!("done".parse::<HealingStatus>().is_err());
    }

    #[test]
    fn test_status_edges() {
        use HealingStatus::*;
        assert!(Pending.can_transition_to(Analyzing));
        assert!(Analyzing.can_transition_to(Pending));
        assert!(Analyzing.can_transition_to(BugConfirmed));
        assert!(!Pending.can_transition_to(Healed));
        assert!(!Healed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Analyzing));
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!(
            "selector_issue".parse::<FailureCategory>().unwrap(),
            FailureCategory::SelectorIssue
        );
        assert_eq!(
            serde_json::to_string(&FailureCategory::ApplicationBug).unwrap(),
            "\"APPLICATION_BUG\""
        );
    }

    #[test]
    fn test_network_entry_accepts_camel_case() {
        let entry: NetworkLogEntry = serde_json::from_str(r#"{"statusCode": 401}"#).unwrap();
        assert!(matches!(
            entry,
            NetworkLogEntry::Response { status_code: 401, .. }
        ));

        let entry: NetworkLogEntry =
            serde_json::from_str(r#"{"errorText": "net::ERR_CONNECTION_REFUSED"}"#).unwrap();
        assert!(matches!(entry, NetworkLogEntry::Failure { .. }));

        let entry: NetworkLogEntry = serde_json::from_str(r#"{"kind": "websocket"}"#).unwrap();
        assert!(matches!(entry, NetworkLogEntry::Opaque(_)));
    }

    #[test]
    fn test_new_failure_from_json() {
        let json = r##"{
            "testId": "t-1",
            "testName": "checkout submits order",
            "error": {"message": "no such element"},
            "context": {
                "dom": "<button>Buy</button>",
                "consoleErrors": ["warn"],
                "networkLogs": [{"statusCode": 200, "url": "/api"}],
                "url": "https://shop.test/cart",
                "selector": "#buy"
            }
        }"##;
        let failure: NewFailure = serde_json::from_str(json).unwrap();
        failure.validate().unwrap();
        let record = FailureRecord::from_new(failure, "e2e");
        assert_eq!(record.status, HealingStatus::Pending);
        assert_eq!(record.test_type, "e2e");
        assert_eq!(record.selector.as_deref(), Some("#buy"));
        assert_eq!(record.healing_attempts, 0);
        assert!(record.screenshot.is_empty());
        record.check_invariants().unwrap();
    }

    #[test]
    fn test_new_failure_requires_ids() {
        let failure = NewFailure {
            test_id: " ".into(),
            test_name: "x".into(),
            ..Default::default()
        };
        assert!(matches!(failure.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_screenshot_round_trips_as_base64() {
        let mut record = FailureRecord::from_new(
            NewFailure {
                test_id: "t".into(),
                test_name: "n".into(),
                ..Default::default()
            },
            "e2e",
        );
        record.screenshot = vec![0x89, b'P', b'N', b'G'];
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["screenshot"], "iVBORw==");
        let back: FailureRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.screenshot, record.screenshot);
    }

    #[test]
    fn test_invariants_reject_unpaired_selector() {
        let mut record = FailureRecord::from_new(
            NewFailure {
                test_id: "t".into(),
                test_name: "n".into(),
                ..Default::default()
            },
            "e2e",
        );
        record.status = HealingStatus::Healed;
        record.healed_selector = Some("#x".into());
        assert!(record.check_invariants().is_err());
        record.confidence_score = Some(0.9);
        record.check_invariants().unwrap();
        record.confidence_score = Some(1.5);
        assert!(record.check_invariants().is_err());
    }

    #[test]
    fn test_filter_limits() {
        assert!(RecordFilter::default().validate().is_ok());
        let too_big = RecordFilter {
            limit: 101,
            ..Default::default()
        };
        assert!(too_big.validate().is_err());
        let zero = RecordFilter {
            limit: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_healing_config_validation() {
        assert!(HealingConfig::default().validate().is_ok());
        let bad = HealingConfig {
            confidence_floor: 1.2,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
