use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured content categories served by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Article,
    Video,
    Recipe,
    WorkoutPlan,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Recipe => "recipe",
            ContentType::WorkoutPlan => "workout_plan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Tenant,
    Private,
}

/// Immutable snapshot of a content item plus the feature fields the
/// scorer reads. Owned by the external content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: Uuid,
    pub author_id: Uuid,
    pub tenant_id: Uuid,
    pub content_type: ContentType,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub comment_count: u32,
    pub view_count: u32,
    pub visibility: Visibility,
    pub location: Option<String>,
}

impl CandidateItem {
    /// Likes plus comments; views are tracked separately for the
    /// engagement-rate sub-term.
    pub fn engagement_total(&self) -> u32 {
        self.like_count + self.comment_count
    }

    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.created_at).num_minutes() as f64 / 60.0).max(0.0)
    }

    pub fn created_hour(&self) -> u8 {
        self.created_at.hour() as u8
    }
}

/// Record of an item already shown to a user. Used only for exclusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRecord {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub tenant_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}

/// Engagement actions consumed from the engagement event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementAction {
    Like,
    Comment,
    Share,
    Save,
    View,
}

impl EngagementAction {
    /// Interest weight of the action when building profiles.
    pub fn weight(&self) -> f64 {
        match self {
            EngagementAction::Like => 1.0,
            EngagementAction::Comment => 2.0,
            EngagementAction::Share => 3.0,
            EngagementAction::Save => 2.5,
            EngagementAction::View => 0.2,
        }
    }

    /// Views are exposure, not engagement.
    pub fn is_engagement(&self) -> bool {
        !matches!(self, EngagementAction::View)
    }
}

/// One event from the engagement stream, enriched with the content
/// features the profile builders need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub author_id: Uuid,
    pub tenant_id: Uuid,
    pub action: EngagementAction,
    pub content_type: ContentType,
    pub tags: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Per-item engagement summary used to compute tenant baselines.
#[derive(Debug, Clone)]
pub struct ItemEngagement {
    pub item_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub engagement_total: u32,
    pub view_count: u32,
}

/// Ranking query accepted from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct RankRequest {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub offset: usize,
    pub weight_profile: Option<String>,
    #[serde(default = "default_true")]
    pub exclude_seen: bool,
    #[serde(default)]
    pub explain: bool,
}

fn default_page_size() -> usize {
    20
}

fn default_true() -> bool {
    true
}

/// The five raw signal scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub content_affinity: f64,
    pub social_affinity: f64,
    pub past_engagement: f64,
    pub timing: f64,
    pub popularity: f64,
}

impl SignalScores {
    pub fn as_array(&self) -> [(&'static str, f64); 5] {
        [
            ("content_affinity", self.content_affinity),
            ("social_affinity", self.social_affinity),
            ("past_engagement", self.past_engagement),
            ("timing", self.timing),
            ("popularity", self.popularity),
        ]
    }
}

/// One signal's contribution within an explained score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub signal: String,
    pub raw: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Full per-candidate breakdown. Transient; only returned when the
/// caller opts into explain mode or hits the diagnostic endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub weight_profile: String,
    pub components: Vec<ScoreComponent>,
    pub final_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedItem {
    pub candidate_id: Uuid,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub items: Vec<RankedItem>,
    pub has_more: bool,
    /// Set when the scoring deadline expired and part of the page was
    /// ordered by recency only.
    #[serde(default)]
    pub degraded: bool,
}
