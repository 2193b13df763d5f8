use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::AlertConfig;
use crate::models::device::DeviceState;
use crate::models::notification::{NotificationLogEntry, NotificationType};
use crate::services::database::DatabaseService;
use crate::services::fcm::{FcmClient, PushError, PushMessage};

type HmacSha256 = Hmac<Sha256>;

pub const LEFT_BEHIND_MESSAGE: &str = "It looks like you left your umbrella behind!";

#[derive(Debug)]
pub enum PushOutcome {
    Sent,
    /// No token registered for the subject. A valid state, not a failure.
    Skipped,
    Failed(PushError),
}

#[derive(Debug)]
pub struct DispatchOutcome {
    pub entry: NotificationLogEntry,
    pub push: PushOutcome,
}

#[derive(Debug)]
pub enum TriggerOutcome {
    NoTransition,
    /// No ownership record for the device: nothing to attribute the alert
    /// to, so neither a push nor a log entry is produced.
    OwnerUnresolved,
    Dispatched(DispatchOutcome),
}

#[derive(Debug, Clone)]
pub struct Subject {
    pub user_id: String,
    pub push_token: Option<String>,
}

/// The disconnect-alert pipeline: trigger listener, subject resolver,
/// notifier and audit logger, awaited in that order. Stages convert their
/// own failures into outcomes; nothing is rolled back.
#[derive(Clone)]
pub struct AlertService {
    db: DatabaseService,
    push: FcmClient,
    ingress_secret: String,
    notifications_link: String,
}

impl AlertService {
    pub fn new(db: DatabaseService, push: FcmClient, config: AlertConfig) -> Self {
        let notifications_link = format!(
            "{}/dashboard/notifications",
            config.app_base_url.trim_end_matches('/')
        );
        Self {
            db,
            push,
            ingress_secret: config.ingress_secret,
            notifications_link,
        }
    }

    /// Edge-triggered: fires only on a connected -> disconnected update.
    /// Creations, deletions, reconnects and repeated disconnected writes
    /// are all no-ops, as is missing state.
    pub fn should_fire(previous: Option<&DeviceState>, current: Option<&DeviceState>) -> bool {
        match (previous, current) {
            (Some(prev), Some(curr)) => prev.connected && !curr.connected,
            _ => false,
        }
    }

    /// Trigger listener entry point, handed the store's before/after pair.
    pub async fn handle_state_written(
        &self,
        previous: Option<&DeviceState>,
        current: Option<&DeviceState>,
    ) -> TriggerOutcome {
        if !Self::should_fire(previous, current) {
            return TriggerOutcome::NoTransition;
        }
        let current = match current {
            Some(state) => state,
            None => return TriggerOutcome::NoTransition,
        };

        log::info!("Device {} disconnected, preparing alert", current.device_id);

        let subject = match self.resolve_subject(&current.device_id) {
            Some(subject) => subject,
            None => {
                log::warn!("No owner found for device {}", current.device_id);
                return TriggerOutcome::OwnerUnresolved;
            }
        };

        let outcome = self
            .dispatch(
                &subject.user_id,
                &current.device_id,
                NotificationType::LeftBehind,
                LEFT_BEHIND_MESSAGE,
                subject.push_token.as_deref(),
            )
            .await;
        TriggerOutcome::Dispatched(outcome)
    }

    /// deviceId -> ownership -> owning user and their push target. A known
    /// owner without a user record or token degrades to log-only rather
    /// than failing the pipeline.
    pub fn resolve_subject(&self, device_id: &str) -> Option<Subject> {
        let ownership = self.db.get_ownership(device_id)?;
        match self.db.get_user(&ownership.user_id) {
            Some(user) => Some(Subject {
                user_id: user.id,
                push_token: user.push_token,
            }),
            None => Some(Subject {
                user_id: ownership.user_id,
                push_token: None,
            }),
        }
    }

    /// Notifier then audit logger. At most one push attempt; the log entry
    /// is written whatever the push outcome was, so "we tried to alert you"
    /// survives a provider outage.
    pub async fn dispatch(
        &self,
        user_id: &str,
        device_id: &str,
        kind: NotificationType,
        message: &str,
        token_override: Option<&str>,
    ) -> DispatchOutcome {
        let token = token_override
            .map(str::to_string)
            .or_else(|| self.db.get_user(user_id).and_then(|u| u.push_token));

        let push = match token {
            Some(token) => {
                let payload = PushMessage {
                    title: kind.title().to_string(),
                    body: message.to_string(),
                    link: self.notifications_link.clone(),
                };
                match self.push.send(&token, &payload).await {
                    Ok(()) => {
                        log::info!("Sent {:?} push to user {}", kind, user_id);
                        PushOutcome::Sent
                    }
                    Err(err) => {
                        log::error!("Push send failed for user {}: {}", user_id, err);
                        PushOutcome::Failed(err)
                    }
                }
            }
            None => {
                log::info!("No push token for user {}, logging only", user_id);
                PushOutcome::Skipped
            }
        };

        let entry = self
            .db
            .append_notification_log(user_id, device_id, kind, message);
        DispatchOutcome { entry, push }
    }

    /// Hex HMAC-SHA256 of the raw request body, carried in `X-Signature`.
    pub fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        let mut mac = match HmacSha256::new_from_slice(self.ingress_secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        let calculated = hex::encode(mac.finalize().into_bytes());
        calculated == signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PushConfig;
    use crate::models::user::RegisterUserRequest;

    fn state(device_id: &str, connected: bool) -> DeviceState {
        DeviceState {
            device_id: device_id.to_string(),
            connected,
            last_updated: chrono::Utc::now(),
        }
    }

    /// Points the push client at a port nothing listens on, so a send
    /// attempt fails fast with a transient error.
    fn unreachable_push_client() -> FcmClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        FcmClient::new(PushConfig {
            api_url: format!("http://127.0.0.1:{}/v1/messages:send", port),
            server_key: "test-key".to_string(),
        })
    }

    fn service(db: DatabaseService) -> AlertService {
        AlertService::new(
            db,
            unreachable_push_client(),
            AlertConfig {
                ingress_secret: "test-secret".to_string(),
                app_base_url: "http://localhost:3000".to_string(),
            },
        )
    }

    fn seed_user(db: &DatabaseService, user_id: &str) {
        db.create_user(RegisterUserRequest {
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            name: user_id.to_string(),
        })
        .unwrap();
    }

    #[test]
    fn only_the_disconnect_edge_fires() {
        let connected = state("umbrella-1", true);
        let disconnected = state("umbrella-1", false);

        assert!(AlertService::should_fire(
            Some(&connected),
            Some(&disconnected)
        ));

        // creation, deletion, reconnect, self-loops
        assert!(!AlertService::should_fire(None, Some(&disconnected)));
        assert!(!AlertService::should_fire(Some(&connected), None));
        assert!(!AlertService::should_fire(None, None));
        assert!(!AlertService::should_fire(
            Some(&disconnected),
            Some(&connected)
        ));
        assert!(!AlertService::should_fire(
            Some(&connected),
            Some(&connected)
        ));
        assert!(!AlertService::should_fire(
            Some(&disconnected),
            Some(&disconnected)
        ));
    }

    #[actix_rt::test]
    async fn unresolved_owner_produces_no_log_entry() {
        let db = DatabaseService::new();
        let alerts = service(db.clone());

        let outcome = alerts
            .handle_state_written(
                Some(&state("umbrella-ghost", true)),
                Some(&state("umbrella-ghost", false)),
            )
            .await;

        assert!(matches!(outcome, TriggerOutcome::OwnerUnresolved));
        let (entries, total) = db.get_notifications_by_user("anyone", 1, 10);
        assert_eq!(total, 0);
        assert!(entries.is_empty());
    }

    #[actix_rt::test]
    async fn owner_without_token_gets_log_only() {
        let db = DatabaseService::new();
        seed_user(&db, "user-8");
        db.register_ownership("umbrella-42", "user-8").unwrap();
        let alerts = service(db.clone());

        let outcome = alerts
            .handle_state_written(
                Some(&state("umbrella-42", true)),
                Some(&state("umbrella-42", false)),
            )
            .await;

        let dispatched = match outcome {
            TriggerOutcome::Dispatched(d) => d,
            other => panic!("expected dispatch, got {:?}", other),
        };
        assert!(matches!(dispatched.push, PushOutcome::Skipped));
        assert_eq!(dispatched.entry.user_id, "user-8");
        assert_eq!(dispatched.entry.device_id, "umbrella-42");
        assert_eq!(dispatched.entry.kind, NotificationType::LeftBehind);
        assert_eq!(dispatched.entry.message, LEFT_BEHIND_MESSAGE);

        let (_, total) = db.get_notifications_by_user("user-8", 1, 10);
        assert_eq!(total, 1);
    }

    #[actix_rt::test]
    async fn push_failure_still_writes_the_log_entry() {
        let db = DatabaseService::new();
        seed_user(&db, "user-7");
        db.set_push_token("user-7", "tok-abc").unwrap();
        db.register_ownership("umbrella-42", "user-7").unwrap();
        let alerts = service(db.clone());

        let outcome = alerts
            .handle_state_written(
                Some(&state("umbrella-42", true)),
                Some(&state("umbrella-42", false)),
            )
            .await;

        let dispatched = match outcome {
            TriggerOutcome::Dispatched(d) => d,
            other => panic!("expected dispatch, got {:?}", other),
        };
        assert!(matches!(
            dispatched.push,
            PushOutcome::Failed(PushError::Transient(_))
        ));
        // alert content is unchanged by the provider failure
        assert_eq!(dispatched.entry.message, LEFT_BEHIND_MESSAGE);
        let (entries, total) = db.get_notifications_by_user("user-7", 1, 10);
        assert_eq!(total, 1);
        assert_eq!(entries[0].kind, NotificationType::LeftBehind);
    }

    #[actix_rt::test]
    async fn redelivered_edges_append_duplicate_entries() {
        // At-least-once delivery is inherited from the event source; the
        // pipeline does not deduplicate.
        let db = DatabaseService::new();
        seed_user(&db, "user-8");
        db.register_ownership("umbrella-42", "user-8").unwrap();
        let alerts = service(db.clone());

        let previous = state("umbrella-42", true);
        let current = state("umbrella-42", false);
        alerts
            .handle_state_written(Some(&previous), Some(&current))
            .await;
        alerts
            .handle_state_written(Some(&previous), Some(&current))
            .await;

        let (_, total) = db.get_notifications_by_user("user-8", 1, 10);
        assert_eq!(total, 2);
    }

    #[test]
    fn signature_verification_round_trip() {
        let alerts = service(DatabaseService::new());
        let body = br#"{"userId":"u1","deviceId":"d1","message":"test"}"#;

        let mut mac = HmacSha256::new_from_slice(b"test-secret").unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(alerts.verify_signature(body, &signature));
        assert!(!alerts.verify_signature(body, "deadbeef"));
        assert!(!alerts.verify_signature(b"tampered", &signature));
    }
}
