//! osu! API client and map descriptor normalization.
//!
//! Beatmap metadata comes from the legacy v1 API (`/api/get_beatmaps`,
//! `/api/get_user`), which returns every field as a string. The raw
//! payload is translated into typed values here and then normalized
//! into a [`MapDescriptor`] snapshot that requests store verbatim.

use async_trait::async_trait;
use osumod_common::{AppError, AppResult};
use osumod_db::entities::queue::GameMode;
use osumod_db::entities::request::{ApprovalStatus, Diff};
use serde::Deserialize;

/// One difficulty as reported by the provider, already typed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBeatmap {
    pub beatmap_id: i64,
    pub beatmapset_id: i64,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub bpm: f64,
    pub total_length_secs: u32,
    /// Difficulty name ("version" in API terms).
    pub version: String,
    pub mode: GameMode,
    pub star_rating: f64,
    /// Circle size, which doubles as the key count for Mania.
    pub key_count: Option<u32>,
    pub approval_status: ApprovalStatus,
}

/// Identity fields of an osu! user, used for username refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOsuUser {
    pub osu_id: i64,
    pub username: String,
    pub country_code: String,
}

/// Fallible lookups against the beatmap metadata provider.
///
/// Implemented by [`OsuApiClient`] in production and mocked in tests.
#[async_trait]
pub trait BeatmapProvider: Send + Sync {
    /// All difficulties of a mapset. Fails with `NotFound` when the
    /// mapset does not exist and `ExternalService` on transport errors.
    async fn beatmaps_by_mapset(&self, mapset_id: i64) -> AppResult<Vec<RawBeatmap>>;

    /// A single difficulty by beatmap id. Used to recover a missing
    /// mapset id on refresh; `None` when the map vanished upstream.
    async fn beatmap_by_id(&self, map_id: i64) -> AppResult<Option<RawBeatmap>>;

    /// Current identity of a user, by their osu! id.
    async fn user_by_osu_id(&self, osu_id: i64) -> AppResult<RawOsuUser>;
}

/// Normalized snapshot of a mapset, ready to persist on a request.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDescriptor {
    pub mapset_id: i64,
    /// Id of the first difficulty, kept as a recovery handle.
    pub map_id: i64,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub bpm: f64,
    /// Total length formatted `m:ss`.
    pub length: String,
    pub diffs: Vec<Diff>,
    pub approval_status: ApprovalStatus,
    pub image_url: String,
}

impl MapDescriptor {
    /// Normalize a mapset's raw difficulties into a descriptor.
    ///
    /// Mania difficulty names get a `[{n}K] ` prefix when they do not
    /// already carry one, and the list is ordered by mode, then key
    /// count, then ascending star rating.
    pub fn from_raw(mapset_id: i64, beatmaps: Vec<RawBeatmap>) -> AppResult<Self> {
        let Some(first) = beatmaps.first().cloned() else {
            return Err(AppError::NotFound(format!("mapset {mapset_id}")));
        };

        let mut diffs: Vec<Diff> = beatmaps
            .iter()
            .map(|b| Diff {
                name: normalize_diff_name(&b.version, b.mode, b.key_count),
                mode: b.mode,
                key_count: if b.mode == GameMode::Mania {
                    b.key_count
                } else {
                    None
                },
                sr: round2(b.star_rating),
            })
            .collect();

        diffs.sort_by(|a, b| {
            a.mode
                .sort_order()
                .cmp(&b.mode.sort_order())
                .then(a.key_count.unwrap_or(0).cmp(&b.key_count.unwrap_or(0)))
                .then(a.sr.total_cmp(&b.sr))
        });

        Ok(Self {
            mapset_id,
            map_id: first.beatmap_id,
            title: first.title,
            artist: first.artist,
            creator: first.creator,
            bpm: first.bpm,
            length: format_length(first.total_length_secs),
            diffs,
            approval_status: first.approval_status,
            image_url: cover_url(mapset_id),
        })
    }
}

/// Cover image URL for a mapset.
#[must_use]
pub fn cover_url(mapset_id: i64) -> String {
    format!("https://assets.ppy.sh/beatmaps/{mapset_id}/covers/cover.jpg")
}

/// Format a length in seconds as `m:ss`.
fn format_length(total_secs: u32) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Inject a `[{n}K] ` prefix for Mania difficulties whose name does
/// not already mention the key count.
fn normalize_diff_name(version: &str, mode: GameMode, key_count: Option<u32>) -> String {
    if mode == GameMode::Mania {
        if let Some(keys) = key_count {
            if !version.contains(&format!("{keys}K")) {
                return format!("[{keys}K] {version}");
            }
        }
    }
    version.to_string()
}

/// Raw v1 beatmap payload; every field is a string.
#[derive(Debug, Deserialize)]
struct ApiBeatmap {
    beatmap_id: String,
    beatmapset_id: String,
    title: String,
    artist: String,
    creator: String,
    bpm: String,
    total_length: String,
    version: String,
    mode: String,
    difficultyrating: String,
    diff_size: String,
    approved: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    user_id: String,
    username: String,
    country: String,
}

impl ApiBeatmap {
    fn into_raw(self) -> AppResult<RawBeatmap> {
        let mode = match self.mode.as_str() {
            "0" => GameMode::Standard,
            "1" => GameMode::Taiko,
            "2" => GameMode::Catch,
            "3" => GameMode::Mania,
            other => {
                return Err(AppError::ExternalService(format!(
                    "unknown gamemode '{other}'"
                )))
            }
        };

        let approval_status = match self.approved.as_str() {
            "-2" => ApprovalStatus::Graveyard,
            "-1" => ApprovalStatus::Wip,
            "0" => ApprovalStatus::Pending,
            "1" => ApprovalStatus::Ranked,
            "2" => ApprovalStatus::Approved,
            "3" => ApprovalStatus::Qualified,
            "4" => ApprovalStatus::Loved,
            other => {
                return Err(AppError::ExternalService(format!(
                    "unknown approval status '{other}'"
                )))
            }
        };

        let parse_err =
            |field: &str| AppError::ExternalService(format!("unparsable beatmap field {field}"));

        Ok(RawBeatmap {
            beatmap_id: self.beatmap_id.parse().map_err(|_| parse_err("beatmap_id"))?,
            beatmapset_id: self
                .beatmapset_id
                .parse()
                .map_err(|_| parse_err("beatmapset_id"))?,
            title: self.title,
            artist: self.artist,
            creator: self.creator,
            bpm: self.bpm.parse().unwrap_or(0.0),
            total_length_secs: self
                .total_length
                .parse()
                .map_err(|_| parse_err("total_length"))?,
            version: self.version,
            mode,
            star_rating: self.difficultyrating.parse().unwrap_or(0.0),
            key_count: self.diff_size.parse().ok(),
            approval_status,
        })
    }
}

/// Client for the osu! legacy v1 API.
#[derive(Clone)]
pub struct OsuApiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OsuApiClient {
    #[must_use]
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }

    async fn get_beatmaps(&self, param: &str, value: &str) -> AppResult<Vec<ApiBeatmap>> {
        let url = format!("{}/api/get_beatmaps", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[("k", self.api_key.as_str()), (param, value)])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "osu! API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! API response malformed: {e}")))
    }
}

#[async_trait]
impl BeatmapProvider for OsuApiClient {
    async fn beatmaps_by_mapset(&self, mapset_id: i64) -> AppResult<Vec<RawBeatmap>> {
        let raw = self.get_beatmaps("s", &mapset_id.to_string()).await?;
        if raw.is_empty() {
            return Err(AppError::NotFound(format!("mapset {mapset_id}")));
        }
        raw.into_iter().map(ApiBeatmap::into_raw).collect()
    }

    async fn beatmap_by_id(&self, map_id: i64) -> AppResult<Option<RawBeatmap>> {
        let raw = self.get_beatmaps("b", &map_id.to_string()).await?;
        raw.into_iter().next().map(ApiBeatmap::into_raw).transpose()
    }

    async fn user_by_osu_id(&self, osu_id: i64) -> AppResult<RawOsuUser> {
        let url = format!("{}/api/get_user", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[("k", self.api_key.as_str()), ("u", &osu_id.to_string())])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! API request failed: {e}")))?;

        let users: Vec<ApiUser> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! API response malformed: {e}")))?;

        let user = users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::UserNotFound(osu_id.to_string()))?;

        Ok(RawOsuUser {
            osu_id: user
                .user_id
                .parse()
                .map_err(|_| AppError::ExternalService("unparsable user id".to_string()))?,
            username: user.username,
            country_code: user.country,
        })
    }
}
