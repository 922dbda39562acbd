use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Statistic name → value. Used both for a fresh fetch result and for the
/// persisted snapshot of a game.
pub type StatValues = BTreeMap<String, i64>;

/// One tracked statistic: the provider's internal name and the label shown in posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub display: String,
}

/// An authenticated Bluesky session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub handle: String,
    pub did: String,
}

/// Reference to a created post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

/// Step of an actor's run. Reported when a run aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetching,
    Diffing,
    Formatting,
    Authenticating,
    Publishing,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fetching => "fetching",
            Stage::Diffing => "diffing",
            Stage::Formatting => "formatting",
            Stage::Authenticating => "authenticating",
            Stage::Publishing => "publishing",
        }
    }
}

/// Terminal state of one actor's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActorOutcome {
    /// No prior snapshot existed; the fetched values became the baseline.
    /// `persisted` is false in dry-run mode.
    Baseline { persisted: bool },
    /// Dry run: the post text that would have been published.
    DryRun { text: String },
    Posted { uri: String, cid: String },
    Aborted { stage: Stage, reason: String },
}

/// One line of the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorReport {
    pub handle: String,
    pub appid: String,
    #[serde(flatten)]
    pub outcome: ActorOutcome,
}
