use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    device::{DeviceOwnership, DeviceState},
    notification::{NotificationLogEntry, NotificationType},
    user::{RegisterUserRequest, User},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("device {0} is already registered")]
    DeviceAlreadyOwned(String),
    #[error("user {0} already exists")]
    UserExists(String),
    #[error("user {0} not found")]
    UserNotFound(String),
}

#[derive(Clone)]
pub struct DatabaseService {
    devices: Arc<Mutex<Vec<DeviceState>>>,
    ownerships: Arc<Mutex<Vec<DeviceOwnership>>>,
    users: Arc<Mutex<Vec<User>>>,
    notification_logs: Arc<Mutex<Vec<NotificationLogEntry>>>,
}

impl DatabaseService {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(Mutex::new(Vec::new())),
            ownerships: Arc::new(Mutex::new(Vec::new())),
            users: Arc::new(Mutex::new(Vec::new())),
            notification_logs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // Device state

    /// Upserts the reported state and returns the (previous, current)
    /// snapshot pair the trigger listener consumes.
    pub fn upsert_device_state(
        &self,
        device_id: &str,
        connected: bool,
    ) -> (Option<DeviceState>, DeviceState) {
        let mut devices = self.devices.lock().unwrap();
        let current = DeviceState {
            device_id: device_id.to_string(),
            connected,
            last_updated: Utc::now(),
        };
        match devices.iter_mut().find(|d| d.device_id == device_id) {
            Some(existing) => {
                let previous = existing.clone();
                *existing = current.clone();
                (Some(previous), current)
            }
            None => {
                devices.push(current.clone());
                (None, current)
            }
        }
    }

    pub fn get_device_state(&self, device_id: &str) -> Option<DeviceState> {
        let devices = self.devices.lock().unwrap();
        devices.iter().find(|d| d.device_id == device_id).cloned()
    }

    pub fn list_device_states(&self) -> Vec<DeviceState> {
        let devices = self.devices.lock().unwrap();
        devices.clone()
    }

    // Ownership

    /// First writer wins: a device keeps its original owner for life.
    pub fn register_ownership(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> Result<DeviceOwnership, StoreError> {
        let mut ownerships = self.ownerships.lock().unwrap();
        if ownerships.iter().any(|o| o.device_id == device_id) {
            return Err(StoreError::DeviceAlreadyOwned(device_id.to_string()));
        }

        let ownership = DeviceOwnership {
            device_id: device_id.to_string(),
            user_id: user_id.to_string(),
            registered_at: Utc::now(),
        };
        ownerships.push(ownership.clone());
        log::info!("Registered device {} to user {}", device_id, user_id);
        Ok(ownership)
    }

    pub fn get_ownership(&self, device_id: &str) -> Option<DeviceOwnership> {
        let ownerships = self.ownerships.lock().unwrap();
        ownerships.iter().find(|o| o.device_id == device_id).cloned()
    }

    // Users

    pub fn create_user(&self, dto: RegisterUserRequest) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.id == dto.user_id) {
            return Err(StoreError::UserExists(dto.user_id));
        }

        let user = User {
            id: dto.user_id,
            email: dto.email,
            name: dto.name,
            push_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(user.clone());
        log::info!("Created user {} ({})", user.name, user.id);
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        let users = self.users.lock().unwrap();
        users.iter().find(|u| u.id == user_id).cloned()
    }

    /// Registers or replaces the user's push token.
    pub fn set_push_token(&self, user_id: &str, token: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.push_token = Some(token.to_string());
                user.updated_at = Utc::now();
                log::info!("Updated push token for user {}", user_id);
                Ok(user.clone())
            }
            None => Err(StoreError::UserNotFound(user_id.to_string())),
        }
    }

    // Notification log

    /// Append-only; entries get a server-assigned id and timestamp and are
    /// never updated afterwards.
    pub fn append_notification_log(
        &self,
        user_id: &str,
        device_id: &str,
        kind: NotificationType,
        message: &str,
    ) -> NotificationLogEntry {
        let mut logs = self.notification_logs.lock().unwrap();
        let entry = NotificationLogEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            device_id: device_id.to_string(),
            kind,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        logs.push(entry.clone());
        log::info!("Notification log {} created for user {}", entry.id, user_id);
        entry
    }

    /// Newest first.
    pub fn get_notifications_by_user(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> (Vec<NotificationLogEntry>, u32) {
        let logs = self.notification_logs.lock().unwrap();
        let mut entries: Vec<NotificationLogEntry> = logs
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.reverse();

        let total = entries.len() as u32;
        let start = ((page - 1) * limit) as usize;
        let data = entries
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();
        (data, total)
    }
}

impl Default for DatabaseService {
    fn default() -> Self {
        Self::new()
    }
}
