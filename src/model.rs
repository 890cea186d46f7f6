use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

/// Enrichment types requested for every unlock.
pub const ENRICHMENT_TYPES: [&str; 3] = ["email", "phone", "linkedin_url"];

/// Estimated charge per unlocked contact, in dollars.
pub const COST_PER_CONTACT: f64 = 0.50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub segment_archetype: String,
    #[serde(default)]
    pub geo_region: String,
    #[serde(default)]
    pub firmographic_company_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leadset {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub segment: Segment,
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub est_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        rename = "lastRunId",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_run_id: Option<String>,
}

impl Leadset {
    /// Intent signals shown on a card: at most three, underscores as spaces.
    pub fn display_signals(&self) -> Vec<String> {
        self.intent
            .signals
            .iter()
            .take(3)
            .map(|s| s.replace('_', " "))
            .collect()
    }
}

/// Lifecycle status of a run. Unknown values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    Running,
    #[default]
    Idle,
    Enriching,
    Done,
    Failed,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Idle => "idle",
            RunStatus::Enriching => "enriching",
            RunStatus::Done => "done",
            RunStatus::Failed => "failed",
            RunStatus::Other(s) => s,
        }
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => RunStatus::Queued,
            "running" => RunStatus::Running,
            "idle" => RunStatus::Idle,
            "enriching" => RunStatus::Enriching,
            "done" => RunStatus::Done,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Other(s),
        }
    }
}

impl From<RunStatus> for String {
    fn from(s: RunStatus) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub enriched: u64,
    #[serde(default)]
    pub selected: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    #[serde(default)]
    pub estimate: f64,
    #[serde(default)]
    pub spent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub leadset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webset_id: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub counters: Counters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Run {
    /// Run as known right after the backend accepted a start request, before
    /// the store has delivered the real document.
    pub fn provisional(leadset_id: &str, started: &StartRunResponse) -> Self {
        Self {
            id: started.run_id.clone(),
            leadset_id: leadset_id.to_string(),
            webset_id: started.webset_id.clone(),
            status: started
                .status
                .clone()
                .map(RunStatus::from)
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Parsed start time. Missing or malformed timestamps yield `None`.
    pub fn started_at_utc(&self) -> Option<OffsetDateTime> {
        self.started_at.as_deref().and_then(parse_timestamp)
    }

    /// Item ids listed on the run document, if any.
    pub fn listed_item_ids(&self) -> Option<&[String]> {
        match self.item_ids.as_deref() {
            Some(ids) if !ids.is_empty() => Some(ids),
            _ => None,
        }
    }
}

/// Parse an RFC 3339 timestamp. The backend writes naive UTC timestamps
/// (no offset), so those are accepted as UTC too.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(t);
    }
    OffsetDateTime::parse(&format!("{raw}Z"), &Rfc3339).ok()
}

/// Short display date such as "Jan 5, 2025"; "N/A" when absent or unparsable.
pub fn format_short_date(raw: Option<&str>) -> String {
    let fmt = format_description!("[month repr:short] [day padding:none], [year]");
    raw.and_then(parse_timestamp)
        .and_then(|t| t.format(&fmt).ok())
        .unwrap_or_else(|| "N/A".to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnrichmentStatus {
    #[default]
    None,
    Queued,
    Enriching,
    Done,
    Failed,
    Other(String),
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EnrichmentStatus::None => "none",
            EnrichmentStatus::Queued => "queued",
            EnrichmentStatus::Enriching => "enriching",
            EnrichmentStatus::Done => "done",
            EnrichmentStatus::Failed => "failed",
            EnrichmentStatus::Other(s) => s,
        }
    }

    /// Enrichment in flight or complete; such items cannot be re-requested.
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            EnrichmentStatus::Queued | EnrichmentStatus::Enriching | EnrichmentStatus::Done
        )
    }
}

impl From<String> for EnrichmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "none" | "" => EnrichmentStatus::None,
            "queued" => EnrichmentStatus::Queued,
            "enriching" => EnrichmentStatus::Enriching,
            "done" => EnrichmentStatus::Done,
            "failed" => EnrichmentStatus::Failed,
            _ => EnrichmentStatus::Other(s),
        }
    }
}

impl From<EnrichmentStatus> for String {
    fn from(s: EnrichmentStatus) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default)]
    pub status: EnrichmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leadset_id: Option<String>,
    #[serde(default)]
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub enrichment: Enrichment,
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(placeholder)
}

impl Item {
    pub fn is_locked(&self) -> bool {
        self.enrichment.status.is_locked()
    }

    pub fn company(&self) -> &str {
        or_placeholder(self.entity.company.as_deref(), "Unknown")
    }

    pub fn domain(&self) -> &str {
        or_placeholder(self.entity.domain.as_deref(), "N/A")
    }

    pub fn platform(&self) -> &str {
        or_placeholder(self.platform.as_deref(), "-")
    }

    pub fn email(&self) -> &str {
        or_placeholder(self.enrichment.email.as_deref(), "-")
    }

    pub fn phone(&self) -> &str {
        or_placeholder(self.enrichment.phone.as_deref(), "-")
    }

    pub fn recency_label(&self) -> String {
        format_short_date(self.recency.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunResponse {
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub webset_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichRequest<'a> {
    #[serde(rename = "itemIds")]
    pub item_ids: &'a [String],
    pub enrichment_types: &'a [&'a str],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub sdk_initialized: Option<bool>,
}

/// Structured notices emitted by controllers and consumed by UI/CLI layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    /// Blocking message the user has to acknowledge.
    Alert(String),
    /// Transient status-line message.
    Info(String),
}

impl Notice {
    pub fn to_message(&self) -> &str {
        match self {
            Notice::Alert(msg) | Notice::Info(msg) => msg,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Notice::Alert(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_decodes_backend_document() {
        let run: Run = serde_json::from_value(json!({
            "id": "run_1a2b3c4d",
            "leadsetId": "ls-1",
            "websetId": "ws_9",
            "status": "running",
            "counters": {"found": 3, "enriched": 0, "selected": 0},
            "cost": {"estimate": 0, "spent": 0},
            "startedAt": "2025-01-05T10:00:00.123456",
            "createdBy": "system"
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.counters.found, 3);
        assert!(run.started_at_utc().is_some());
        assert!(run.listed_item_ids().is_none());
    }

    #[test]
    fn unknown_status_round_trips_verbatim() {
        let run: Run = serde_json::from_value(json!({"id": "r", "status": "started"})).unwrap();
        assert_eq!(run.status, RunStatus::Other("started".into()));
        assert_eq!(serde_json::to_value(&run).unwrap()["status"], "started");
    }

    #[test]
    fn empty_item_id_list_counts_as_absent() {
        let run: Run = serde_json::from_value(json!({"id": "r", "itemIds": []})).unwrap();
        assert!(run.listed_item_ids().is_none());
    }

    #[test]
    fn item_placeholders() {
        let item = Item {
            entity: Entity {
                company: Some(String::new()),
                domain: None,
            },
            ..Default::default()
        };
        assert_eq!(item.company(), "Unknown");
        assert_eq!(item.domain(), "N/A");
        assert_eq!(item.platform(), "-");
        assert_eq!(item.email(), "-");
        assert_eq!(item.recency_label(), "N/A");
        assert_eq!(item.enrichment.status.as_str(), "none");
    }

    #[test]
    fn short_dates() {
        assert_eq!(format_short_date(Some("2025-01-05T10:00:00Z")), "Jan 5, 2025");
        assert_eq!(format_short_date(Some("2024-11-23T08:15:00.123")), "Nov 23, 2024");
        assert_eq!(format_short_date(Some("last week")), "N/A");
        assert_eq!(format_short_date(None), "N/A");
    }

    #[test]
    fn locked_statuses() {
        assert!(!EnrichmentStatus::None.is_locked());
        assert!(!EnrichmentStatus::Failed.is_locked());
        assert!(EnrichmentStatus::Queued.is_locked());
        assert!(EnrichmentStatus::Enriching.is_locked());
        assert!(EnrichmentStatus::Done.is_locked());
    }

    #[test]
    fn item_without_enrichment_defaults_to_none() {
        let item: Item = serde_json::from_value(json!({
            "itemId": "a",
            "entity": {"company": "Acme", "domain": "acme.io"}
        }))
        .unwrap();
        assert_eq!(item.enrichment.status, EnrichmentStatus::None);
        assert!(!item.is_locked());
    }

    #[test]
    fn display_signals_caps_and_humanizes() {
        let ls = Leadset {
            intent: Intent {
                signals: vec![
                    "hiring_sdr".into(),
                    "raised_series_a".into(),
                    "new_cto".into(),
                    "fourth".into(),
                ],
            },
            ..Default::default()
        };
        assert_eq!(
            ls.display_signals(),
            vec!["hiring sdr", "raised series a", "new cto"]
        );
    }

    #[test]
    fn enrich_request_wire_shape() {
        let ids = vec!["a".to_string()];
        let body = serde_json::to_value(EnrichRequest {
            item_ids: &ids,
            enrichment_types: &ENRICHMENT_TYPES,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"itemIds": ["a"], "enrichment_types": ["email", "phone", "linkedin_url"]})
        );
    }
}
