//! Message listener — applies Iris replies to the schedule.

use std::sync::Arc;

use chrono::Utc;
use irisfarm_telegram::types::{Message, User};
use tokio::sync::Mutex;

use crate::classify::{self, Reply};
use crate::schedule::FarmSchedule;

/// The Iris account whose replies the listener accepts.
///
/// Resolved once at startup and immutable afterwards. The Bot API has no
/// username-to-id lookup for other bots, so when no numeric id is known,
/// matching falls back to the username.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    id: Option<i64>,
    username: String,
}

impl BotIdentity {
    pub fn new(username: &str, id: Option<i64>) -> Self {
        Self {
            id,
            username: username.trim_start_matches('@').to_string(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Does this sender look like Iris?
    pub fn matches(&self, user: &User) -> bool {
        if let Some(id) = self.id {
            return user.id == id;
        }
        user.username
            .as_deref()
            .is_some_and(|u| u.eq_ignore_ascii_case(&self.username))
    }
}

/// Listens for Iris replies in the target group and reschedules accordingly.
pub struct Listener {
    identity: BotIdentity,
    group_id: i64,
    schedule: Arc<Mutex<FarmSchedule>>,
}

impl Listener {
    pub fn new(identity: BotIdentity, group_id: i64, schedule: Arc<Mutex<FarmSchedule>>) -> Self {
        Self {
            identity,
            group_id,
            schedule,
        }
    }

    /// Filter one inbound message; replies from Iris in the target group
    /// drive a schedule transition, everything else is ignored.
    pub async fn handle_message(&self, message: &Message) {
        if message.chat.id != self.group_id {
            return;
        }
        let Some(from) = &message.from else {
            return;
        };
        if !self.identity.matches(from) {
            return;
        }
        let Some(text) = &message.text else {
            return;
        };
        self.handle_reply(text).await;
    }

    /// Classify one reply and apply the transition. Runs to completion
    /// before the next message is processed; the new next-farm time is
    /// visible to the farm loop as soon as the lock is released.
    pub async fn handle_reply(&self, text: &str) {
        tracing::info!("Message from Iris: {text}");

        let reply = classify::classify(text);
        let mut sched = self.schedule.lock().await;
        let next = sched.apply(&reply, Utc::now());

        match reply {
            Reply::Success => {
                tracing::info!("✅ Farm succeeded! Next attempt at {next}");
            }
            Reply::Failure { hours, minutes } => {
                tracing::info!("❌ Farm refused. Next attempt in {hours}h {minutes}m ({next})");
            }
            Reply::Unknown => {
                tracing::warn!("⚠️ Unrecognized reply from Iris, retrying at {next}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use irisfarm_telegram::types::Chat;

    const GROUP: i64 = -1001234567890;

    fn iris_user() -> User {
        User {
            id: 707693258,
            is_bot: true,
            first_name: "Iris".into(),
            last_name: None,
            username: Some("iris_cm_bot".into()),
        }
    }

    fn group_message(from: Option<User>, chat_id: i64, text: Option<&str>) -> Message {
        Message {
            message_id: 1,
            from,
            chat: Chat {
                id: chat_id,
                chat_type: "supergroup".into(),
                title: Some("Farm chat".into()),
                username: None,
            },
            text: text.map(String::from),
            date: 0,
        }
    }

    fn listener(identity: BotIdentity) -> (Listener, Arc<Mutex<FarmSchedule>>) {
        let schedule = Arc::new(Mutex::new(FarmSchedule::new(Utc::now())));
        (Listener::new(identity, GROUP, schedule.clone()), schedule)
    }

    #[test]
    fn test_identity_matches_by_id_when_known() {
        let identity = BotIdentity::new("iris_cm_bot", Some(707693258));
        assert!(identity.matches(&iris_user()));

        let mut stranger = iris_user();
        stranger.id = 1;
        assert!(!identity.matches(&stranger));
    }

    #[test]
    fn test_identity_falls_back_to_username() {
        let identity = BotIdentity::new("@Iris_CM_Bot", None);
        assert!(identity.matches(&iris_user()));

        let mut nameless = iris_user();
        nameless.username = None;
        assert!(!identity.matches(&nameless));
    }

    #[tokio::test]
    async fn test_success_reply_reschedules() {
        let (listener, schedule) = listener(BotIdentity::new("iris_cm_bot", None));
        let before = Utc::now();

        listener
            .handle_message(&group_message(
                Some(iris_user()),
                GROUP,
                Some("ЗАЧЁТ! Отлично!"),
            ))
            .await;

        let next = schedule.lock().await.next_farm_time;
        assert!(next >= before + Duration::hours(4));
    }

    #[tokio::test]
    async fn test_failure_reply_uses_cooldown() {
        let (listener, schedule) = listener(BotIdentity::new("iris_cm_bot", None));
        let before = Utc::now();

        listener
            .handle_reply("НЕЗАЧЁТ, приходи через 1 час 45 мин")
            .await;

        let next = schedule.lock().await.next_farm_time;
        assert!(next >= before + Duration::hours(1) + Duration::minutes(45));
        assert!(next <= Utc::now() + Duration::hours(1) + Duration::minutes(45));
    }

    #[tokio::test]
    async fn test_wrong_chat_is_ignored() {
        let (listener, schedule) = listener(BotIdentity::new("iris_cm_bot", None));
        let initial = schedule.lock().await.next_farm_time;

        listener
            .handle_message(&group_message(Some(iris_user()), -42, Some("ЗАЧЁТ")))
            .await;

        assert_eq!(schedule.lock().await.next_farm_time, initial);
    }

    #[tokio::test]
    async fn test_wrong_sender_is_ignored() {
        let (listener, schedule) = listener(BotIdentity::new("iris_cm_bot", Some(707693258)));
        let initial = schedule.lock().await.next_farm_time;

        let mut human = iris_user();
        human.id = 555;
        human.username = Some("some_player".into());
        listener
            .handle_message(&group_message(Some(human), GROUP, Some("ЗАЧЁТ")))
            .await;

        assert_eq!(schedule.lock().await.next_farm_time, initial);
    }

    #[tokio::test]
    async fn test_message_without_text_is_ignored() {
        let (listener, schedule) = listener(BotIdentity::new("iris_cm_bot", None));
        let initial = schedule.lock().await.next_farm_time;

        listener
            .handle_message(&group_message(Some(iris_user()), GROUP, None))
            .await;

        assert_eq!(schedule.lock().await.next_farm_time, initial);
    }
}
