//! Feedback and cooldown service
//!
//! Rate-limits suggestion/review submissions per user and keeps the feedback
//! cards handed to the admin. Cooldown baselines are in-memory only and reset
//! on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::config::FeedbackConfig;
use crate::models::{Feedback, FeedbackKind};
use crate::utils::errors::{Result, SupportBuddyError};

/// Outcome of a cooldown check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownVerdict {
    Allowed,
    /// Remaining wait, whole hours rounded up
    Blocked { remaining_hours: i64 },
}

/// Feedback store and per-user submission rate limiter
#[derive(Clone)]
pub struct FeedbackService {
    last_submission: Arc<Mutex<HashMap<(i64, FeedbackKind), DateTime<Utc>>>>,
    feedbacks: Arc<Mutex<HashMap<String, Feedback>>>,
    config: FeedbackConfig,
}

impl FeedbackService {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            last_submission: Arc::new(Mutex::new(HashMap::new())),
            feedbacks: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Check whether a user may submit feedback of this kind right now
    pub async fn check_cooldown(&self, user_id: i64, kind: FeedbackKind) -> CooldownVerdict {
        self.check_cooldown_at(user_id, kind, Utc::now()).await
    }

    /// Cooldown check against an explicit instant
    pub async fn check_cooldown_at(
        &self,
        user_id: i64,
        kind: FeedbackKind,
        now: DateTime<Utc>,
    ) -> CooldownVerdict {
        if !self.config.cooldown_enabled {
            return CooldownVerdict::Allowed;
        }

        let last = match self.last_submission.lock().await.get(&(user_id, kind)).copied() {
            Some(last) => last,
            None => return CooldownVerdict::Allowed,
        };

        let elapsed = (now - last).num_seconds();
        let need = self.config.cooldown_hours * 3600;
        if elapsed >= need {
            CooldownVerdict::Allowed
        } else {
            CooldownVerdict::Blocked {
                remaining_hours: (need - elapsed + 3599) / 3600,
            }
        }
    }

    /// Record "now" as the new cooldown baseline
    ///
    /// Skipped for cooldown-exempt submissions (feedback solicited right
    /// after a rating), so the prompted submission does not push out the
    /// clock of a future independent one.
    pub async fn record_submission(&self, user_id: i64, kind: FeedbackKind, exempt: bool) {
        if exempt {
            info!(user_id = user_id, kind = kind.as_str(), "Cooldown-exempt submission, baseline unchanged");
            return;
        }
        self.record_submission_at(user_id, kind, Utc::now()).await;
    }

    /// Record a baseline at an explicit instant
    pub async fn record_submission_at(&self, user_id: i64, kind: FeedbackKind, at: DateTime<Utc>) {
        self.last_submission.lock().await.insert((user_id, kind), at);
        info!(user_id = user_id, kind = kind.as_str(), "Updated feedback cooldown baseline");
    }

    /// Create a feedback item; always succeeds regardless of cooldown state
    pub async fn create_feedback(&self, user_id: i64, kind: FeedbackKind, text: String) -> Feedback {
        let id = format!("{}_{}", kind.id_prefix(), &Uuid::new_v4().simple().to_string()[..8]);
        let feedback = Feedback {
            id: id.clone(),
            user_id,
            kind,
            text,
            thanked: false,
            message_id: None,
        };
        self.feedbacks.lock().await.insert(id.clone(), feedback.clone());
        info!(feedback_id = %id, user_id = user_id, kind = kind.as_str(), "Created feedback");
        feedback
    }

    /// Mark a feedback item as thanked
    pub async fn thank(&self, feedback_id: &str) -> Result<Feedback> {
        let mut feedbacks = self.feedbacks.lock().await;
        let feedback = feedbacks
            .get_mut(feedback_id)
            .ok_or_else(|| SupportBuddyError::FeedbackNotFound { id: feedback_id.to_string() })?;
        feedback.thanked = true;
        info!(feedback_id = %feedback_id, "Feedback marked as thanked");
        Ok(feedback.clone())
    }

    /// Remember the rendered card so the thank toggle can edit it
    pub async fn set_message_id(&self, feedback_id: &str, message_id: i32) {
        if let Some(feedback) = self.feedbacks.lock().await.get_mut(feedback_id) {
            feedback.message_id = Some(message_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn service(enabled: bool, hours: i64) -> FeedbackService {
        FeedbackService::new(FeedbackConfig {
            cooldown_enabled: enabled,
            cooldown_hours: hours,
        })
    }

    #[tokio::test]
    async fn test_cooldown_math() {
        let svc = service(true, 24);
        let t0 = Utc::now();
        svc.record_submission_at(7, FeedbackKind::Review, t0).await;

        assert_eq!(
            svc.check_cooldown_at(7, FeedbackKind::Review, t0 + Duration::hours(1)).await,
            CooldownVerdict::Blocked { remaining_hours: 23 }
        );
        assert_eq!(
            svc.check_cooldown_at(7, FeedbackKind::Review, t0 + Duration::minutes(1)).await,
            CooldownVerdict::Blocked { remaining_hours: 24 }
        );
        assert_eq!(
            svc.check_cooldown_at(7, FeedbackKind::Review, t0 + Duration::hours(24)).await,
            CooldownVerdict::Allowed
        );
    }

    #[tokio::test]
    async fn test_cooldown_is_per_kind_and_per_user() {
        let svc = service(true, 24);
        let t0 = Utc::now();
        svc.record_submission_at(7, FeedbackKind::Review, t0).await;

        assert_eq!(
            svc.check_cooldown_at(7, FeedbackKind::Suggestion, t0 + Duration::hours(1)).await,
            CooldownVerdict::Allowed
        );
        assert_eq!(
            svc.check_cooldown_at(8, FeedbackKind::Review, t0 + Duration::hours(1)).await,
            CooldownVerdict::Allowed
        );
    }

    #[tokio::test]
    async fn test_cooldown_disabled_always_allows() {
        let svc = service(false, 24);
        let t0 = Utc::now();
        svc.record_submission_at(7, FeedbackKind::Review, t0).await;
        assert_eq!(
            svc.check_cooldown_at(7, FeedbackKind::Review, t0 + Duration::hours(1)).await,
            CooldownVerdict::Allowed
        );
    }

    #[tokio::test]
    async fn test_exempt_submission_keeps_baseline() {
        let svc = service(true, 24);
        svc.record_submission(7, FeedbackKind::Suggestion, true).await;
        assert_eq!(
            svc.check_cooldown(7, FeedbackKind::Suggestion).await,
            CooldownVerdict::Allowed
        );
    }

    #[tokio::test]
    async fn test_feedback_creation_and_thank() {
        let svc = service(true, 24);
        let feedback = svc
            .create_feedback(7, FeedbackKind::Suggestion, "add dark mode".into())
            .await;
        assert!(feedback.id.starts_with("sug_"));
        assert!(!feedback.thanked);

        svc.set_message_id(&feedback.id, 555).await;
        let thanked = svc.thank(&feedback.id).await.unwrap();
        assert!(thanked.thanked);
        assert_eq!(thanked.message_id, Some(555));

        assert_matches!(
            svc.thank("rev_deadbeef").await,
            Err(SupportBuddyError::FeedbackNotFound { .. })
        );
    }
}
