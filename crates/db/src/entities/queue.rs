//! Queue entity.
//!
//! One queue per owning user, at most one non-archived at a time.
//! Re-creation un-archives the existing row instead of duplicating it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::request::RequestStatus;

/// Gamemodes a queue can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Standard,
    Taiko,
    #[serde(rename = "Catch the Beat")]
    Catch,
    Mania,
}

impl GameMode {
    /// Fixed ordering used when sorting difficulties.
    #[must_use]
    pub const fn sort_order(self) -> u8 {
        match self {
            Self::Standard => 0,
            Self::Taiko => 1,
            Self::Catch => 2,
            Self::Mania => 3,
        }
    }

    /// The display name, identical to the stored serde string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Taiko => "Taiko",
            Self::Catch => "Catch the Beat",
            Self::Mania => "Mania",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modder role, determining the approval-status filter and the status
/// vocabulary available to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ModderType {
    /// Full Beatmap Nominator.
    #[sea_orm(string_value = "full")]
    #[serde(rename = "full")]
    Full,
    /// Probationary Beatmap Nominator.
    #[sea_orm(string_value = "probation")]
    #[serde(rename = "probation")]
    Probation,
    /// Regular modder.
    #[sea_orm(string_value = "modder")]
    #[serde(rename = "modder")]
    Modder,
}

impl ModderType {
    /// Whether this role is a Beatmap Nominator (full or probationary).
    #[must_use]
    pub const fn is_nominator(self) -> bool {
        matches!(self, Self::Full | Self::Probation)
    }

    /// The closed set of statuses the owner may assign to requests.
    ///
    /// The nominator vocabulary is a superset of the modder vocabulary
    /// except for `Finished`, which only plain modders use.
    #[must_use]
    pub const fn vocabulary(self) -> &'static [RequestStatus] {
        match self {
            Self::Modder => &[
                RequestStatus::Pending,
                RequestStatus::Accepted,
                RequestStatus::Rejected,
                RequestStatus::Finished,
            ],
            Self::Full | Self::Probation => &[
                RequestStatus::Pending,
                RequestStatus::Accepted,
                RequestStatus::Rejected,
                RequestStatus::Modded,
                RequestStatus::Nominated,
                RequestStatus::Qualified,
                RequestStatus::Ranked,
            ],
        }
    }
}

/// A user's request queue configuration and state.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning user. At most one non-archived queue per owner.
    #[sea_orm(indexed)]
    pub owner_id: String,

    /// Accepting new requests.
    pub open: bool,

    /// Hidden from the public listing. Independent of `open`.
    pub archived: bool,

    /// Pending-request cap before auto-close. NULL = unlimited.
    #[sea_orm(nullable)]
    pub max_pending: Option<i32>,

    /// Minimum days between requests from the same requester.
    #[sea_orm(default_value = 0)]
    pub cooldown: i32,

    /// Whether mod4mod requests are accepted/flagged.
    #[sea_orm(default_value = false)]
    pub accept_m4m: bool,

    pub modder_type: ModderType,

    /// Accepted gamemodes (JSON array of [`GameMode`] strings, non-empty).
    #[sea_orm(column_type = "JsonBinary")]
    pub modes: Json,

    /// Custom queue title shown instead of the generated one.
    #[sea_orm(nullable)]
    pub title: Option<String>,

    /// Free-form owner notes shown on the request page.
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// Last time the owner performed any state-changing action.
    /// Drives the maintenance sweep.
    #[sea_orm(indexed)]
    pub last_actioned_at: DateTimeWithTimeZone,

    /// Creation or most recent reactivation time. Drives the new-queue
    /// leniency window of the sweep.
    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Decode the accepted gamemodes from their JSON column.
    ///
    /// Unknown values are skipped rather than failing the whole queue.
    #[must_use]
    pub fn game_modes(&self) -> Vec<GameMode> {
        self.modes
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
