//! Request admission rules.
//!
//! Each rule is evaluated independently and every failure is collected,
//! so the requester sees all reasons at once instead of fixing them one
//! at a time. Failures here are user-facing strings, not errors; the
//! caller decides what to do with them (the queue owner bypasses them
//! entirely).

use chrono::{DateTime, Utc};
use osumod_db::entities::request::ApprovalStatus;
use osumod_db::entities::{queue, request};

use super::osu::MapDescriptor;

/// Longest comment a requester may attach.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Approval statuses nominator queues accept.
const NOMINATABLE: &[ApprovalStatus] = &[
    ApprovalStatus::Pending,
    ApprovalStatus::Wip,
    ApprovalStatus::Graveyard,
];

/// Evaluate every admission rule for a submission.
///
/// `prior` is the requester's most recent earlier request to the same
/// target, which drives the cooldown check.
#[must_use]
pub fn evaluate(
    queue: &queue::Model,
    descriptor: &MapDescriptor,
    prior: Option<&request::Model>,
    comment: &str,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut errors = Vec::new();

    let accepted = queue.game_modes();
    if !descriptor.diffs.iter().any(|d| accepted.contains(&d.mode)) {
        let list: Vec<&str> = accepted.iter().map(|m| m.as_str()).collect();
        errors.push(format!(
            "Must be one of the following gamemodes: {}",
            list.join(", ")
        ));
    }

    if queue.modder_type.is_nominator() && !NOMINATABLE.contains(&descriptor.approval_status) {
        errors.push(format!(
            "Expected a Pending map (this is {})",
            descriptor.approval_status
        ));
    }

    if comment.chars().count() > MAX_COMMENT_LENGTH {
        errors.push("Comment is excessively long".to_string());
    }

    if !queue.open {
        errors.push("Requests are closed".to_string());
    }

    if let Some(prior) = prior {
        if queue.cooldown > 0 {
            let elapsed_days =
                (now - prior.request_date.with_timezone(&Utc)).num_seconds() as f64 / 86_400.0;
            let remaining = f64::from(queue.cooldown) - elapsed_days;
            if remaining > 0.0 {
                let rounded = (remaining * 100.0).round() / 100.0;
                errors.push(format!(
                    "You need to wait {rounded} days before you can request again"
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use osumod_db::entities::queue::{GameMode, ModderType};
    use osumod_db::entities::request::{Diff, RequestStatus};
    use serde_json::json;

    fn test_queue(modes: &[&str]) -> queue::Model {
        queue::Model {
            id: "q1".to_string(),
            owner_id: "owner".to_string(),
            open: true,
            archived: false,
            max_pending: Some(5),
            cooldown: 0,
            accept_m4m: false,
            modder_type: ModderType::Modder,
            modes: json!(modes),
            title: None,
            notes: None,
            last_actioned_at: Utc::now().into(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn descriptor_with(diffs: Vec<Diff>, approval: ApprovalStatus) -> MapDescriptor {
        MapDescriptor {
            mapset_id: 10,
            map_id: 100,
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            creator: "Mapper".to_string(),
            bpm: 180.0,
            length: "2:30".to_string(),
            diffs,
            approval_status: approval,
            image_url: String::new(),
        }
    }

    fn diff(mode: GameMode, sr: f64) -> Diff {
        Diff {
            name: "diff".to_string(),
            mode,
            key_count: None,
            sr,
        }
    }

    fn prior_request(days_ago: i64, now: DateTime<Utc>) -> request::Model {
        request::Model {
            id: "r0".to_string(),
            requester_id: "u1".to_string(),
            target_id: "owner".to_string(),
            request_date: (now - Duration::days(days_ago)).into(),
            map_id: 100,
            mapset_id: Some(10),
            title: "Old".to_string(),
            artist: "Old".to_string(),
            creator: "Old".to_string(),
            bpm: 120.0,
            length: "1:00".to_string(),
            diffs: json!([]),
            approval_status: ApprovalStatus::Pending,
            image_url: String::new(),
            comment: String::new(),
            m4m: false,
            status: RequestStatus::Pending,
            feedback: None,
            archived: false,
        }
    }

    #[test]
    fn test_accepts_matching_submission() {
        let queue = test_queue(&["Taiko"]);
        let descriptor = descriptor_with(vec![diff(GameMode::Taiko, 4.0)], ApprovalStatus::Pending);
        let errors = evaluate(&queue, &descriptor, None, "please mod", Utc::now());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_gamemode_filter_lists_accepted_modes() {
        let queue = test_queue(&["Taiko"]);
        let descriptor =
            descriptor_with(vec![diff(GameMode::Standard, 4.0)], ApprovalStatus::Pending);
        let errors = evaluate(&queue, &descriptor, None, "", Utc::now());
        assert_eq!(
            errors,
            vec!["Must be one of the following gamemodes: Taiko".to_string()]
        );
    }

    #[test]
    fn test_one_matching_difficulty_is_enough() {
        let queue = test_queue(&["Taiko"]);
        let descriptor = descriptor_with(
            vec![diff(GameMode::Standard, 3.0), diff(GameMode::Taiko, 4.0)],
            ApprovalStatus::Pending,
        );
        assert!(evaluate(&queue, &descriptor, None, "", Utc::now()).is_empty());
    }

    #[test]
    fn test_nominator_rejects_ranked_map() {
        let mut queue = test_queue(&["Standard"]);
        queue.modder_type = ModderType::Full;
        let descriptor =
            descriptor_with(vec![diff(GameMode::Standard, 4.0)], ApprovalStatus::Ranked);
        let errors = evaluate(&queue, &descriptor, None, "", Utc::now());
        assert_eq!(
            errors,
            vec!["Expected a Pending map (this is Ranked)".to_string()]
        );
    }

    #[test]
    fn test_nominator_accepts_graveyard_and_wip() {
        let mut queue = test_queue(&["Standard"]);
        queue.modder_type = ModderType::Probation;
        for approval in [ApprovalStatus::Graveyard, ApprovalStatus::Wip] {
            let descriptor = descriptor_with(vec![diff(GameMode::Standard, 4.0)], approval);
            assert!(evaluate(&queue, &descriptor, None, "", Utc::now()).is_empty());
        }
    }

    #[test]
    fn test_plain_modder_ignores_approval_status() {
        let queue = test_queue(&["Standard"]);
        let descriptor =
            descriptor_with(vec![diff(GameMode::Standard, 4.0)], ApprovalStatus::Loved);
        assert!(evaluate(&queue, &descriptor, None, "", Utc::now()).is_empty());
    }

    #[test]
    fn test_overlong_comment() {
        let queue = test_queue(&["Standard"]);
        let descriptor =
            descriptor_with(vec![diff(GameMode::Standard, 4.0)], ApprovalStatus::Pending);
        let comment = "a".repeat(501);
        let errors = evaluate(&queue, &descriptor, None, &comment, Utc::now());
        assert_eq!(errors, vec!["Comment is excessively long".to_string()]);

        let exactly_max = "a".repeat(500);
        assert!(evaluate(&queue, &descriptor, None, &exactly_max, Utc::now()).is_empty());
    }

    #[test]
    fn test_closed_queue() {
        let mut queue = test_queue(&["Standard"]);
        queue.open = false;
        let descriptor =
            descriptor_with(vec![diff(GameMode::Standard, 4.0)], ApprovalStatus::Pending);
        let errors = evaluate(&queue, &descriptor, None, "", Utc::now());
        assert_eq!(errors, vec!["Requests are closed".to_string()]);
    }

    #[test]
    fn test_cooldown_remaining_days() {
        let mut queue = test_queue(&["Taiko"]);
        queue.cooldown = 14;
        let descriptor = descriptor_with(vec![diff(GameMode::Taiko, 4.0)], ApprovalStatus::Pending);
        let now = Utc::now();
        let prior = prior_request(3, now);

        let errors = evaluate(&queue, &descriptor, Some(&prior), "", now);
        assert_eq!(
            errors,
            vec!["You need to wait 11 days before you can request again".to_string()]
        );
    }

    #[test]
    fn test_cooldown_expired() {
        let mut queue = test_queue(&["Taiko"]);
        queue.cooldown = 14;
        let descriptor = descriptor_with(vec![diff(GameMode::Taiko, 4.0)], ApprovalStatus::Pending);
        let now = Utc::now();
        let prior = prior_request(15, now);
        assert!(evaluate(&queue, &descriptor, Some(&prior), "", now).is_empty());
    }

    #[test]
    fn test_no_cooldown_without_prior_request() {
        let mut queue = test_queue(&["Taiko"]);
        queue.cooldown = 14;
        let descriptor = descriptor_with(vec![diff(GameMode::Taiko, 4.0)], ApprovalStatus::Pending);
        assert!(evaluate(&queue, &descriptor, None, "", Utc::now()).is_empty());
    }

    #[test]
    fn test_fractional_cooldown_rounded_to_two_decimals() {
        let mut queue = test_queue(&["Taiko"]);
        queue.cooldown = 7;
        let descriptor = descriptor_with(vec![diff(GameMode::Taiko, 4.0)], ApprovalStatus::Pending);
        let now = Utc::now();
        let mut prior = prior_request(0, now);
        // 1.5 days ago leaves 5.5 days of cooldown.
        prior.request_date = (now - Duration::hours(36)).into();

        let errors = evaluate(&queue, &descriptor, Some(&prior), "", now);
        assert_eq!(
            errors,
            vec!["You need to wait 5.5 days before you can request again".to_string()]
        );
    }

    #[test]
    fn test_all_failures_collected() {
        let mut queue = test_queue(&["Taiko"]);
        queue.open = false;
        queue.cooldown = 14;
        queue.modder_type = ModderType::Full;
        let descriptor =
            descriptor_with(vec![diff(GameMode::Standard, 4.0)], ApprovalStatus::Ranked);
        let now = Utc::now();
        let prior = prior_request(1, now);
        let comment = "a".repeat(600);

        let errors = evaluate(&queue, &descriptor, Some(&prior), &comment, now);
        assert_eq!(errors.len(), 5);
    }
}
