//! Request entity.
//!
//! One submission of a beatmapset to a target queue, carrying a snapshot
//! of the map's metadata as it looked at request time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::queue::GameMode;

/// Owner-assigned request status.
///
/// Which values are reachable depends on the target queue's modder type;
/// see [`super::queue::ModderType::vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RequestStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Modded")]
    Modded,
    #[sea_orm(string_value = "Finished")]
    Finished,
    #[sea_orm(string_value = "Nominated")]
    Nominated,
    #[sea_orm(string_value = "Qualified")]
    Qualified,
    #[sea_orm(string_value = "Ranked")]
    Ranked,
}

/// Beatmapset approval status as reported by the osu! API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "Graveyard")]
    Graveyard,
    #[sea_orm(string_value = "WIP")]
    Wip,
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Ranked")]
    Ranked,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Qualified")]
    Qualified,
    #[sea_orm(string_value = "Loved")]
    Loved,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Graveyard => "Graveyard",
            Self::Wip => "WIP",
            Self::Pending => "Pending",
            Self::Ranked => "Ranked",
            Self::Approved => "Approved",
            Self::Qualified => "Qualified",
            Self::Loved => "Loved",
        };
        f.write_str(s)
    }
}

/// One difficulty of a snapshotted mapset, stored inside the `diffs`
/// JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub name: String,
    pub mode: GameMode,
    /// Key count, Mania only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_count: Option<u32>,
    /// Star rating, rounded to 2 decimals.
    pub sr: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who submitted the request.
    #[sea_orm(indexed)]
    pub requester_id: String,

    /// Owner of the target queue.
    #[sea_orm(indexed)]
    pub target_id: String,

    /// Submission time. Immutable; drives cooldowns and pagination.
    #[sea_orm(indexed)]
    pub request_date: DateTimeWithTimeZone,

    /// Id of the first difficulty, used to recover the mapset id for
    /// legacy rows that predate `mapset_id`.
    pub map_id: i64,

    #[sea_orm(nullable)]
    pub mapset_id: Option<i64>,

    pub title: String,

    pub artist: String,

    /// Mapper name as reported by the provider.
    pub creator: String,

    #[sea_orm(column_type = "Double")]
    pub bpm: f64,

    /// Preformatted total length, `m:ss`.
    pub length: String,

    /// Ordered difficulty list (JSON array of [`Diff`]).
    #[sea_orm(column_type = "JsonBinary")]
    pub diffs: Json,

    /// Provider approval status at request time.
    pub approval_status: ApprovalStatus,

    /// Cover image URL derived from the mapset id.
    pub image_url: String,

    /// Requester-supplied comment, at most 500 characters.
    #[sea_orm(column_type = "Text")]
    pub comment: String,

    /// Mod4mod flag.
    #[sea_orm(default_value = false)]
    pub m4m: bool,

    pub status: RequestStatus,

    /// Owner-supplied feedback.
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,

    #[sea_orm(default_value = false)]
    pub archived: bool,
}

impl Model {
    /// Decode the snapshotted difficulties from their JSON column.
    #[must_use]
    pub fn difficulties(&self) -> Vec<Diff> {
        serde_json::from_value(self.diffs.clone()).unwrap_or_default()
    }

    /// Whether the owner has ever acted on this request: a status change,
    /// feedback, or archival all count.
    #[must_use]
    pub fn is_actioned(&self) -> bool {
        self.status != RequestStatus::Pending
            || self.archived
            || self.feedback.as_deref().is_some_and(|f| !f.is_empty())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RequesterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Requester,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TargetId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}
