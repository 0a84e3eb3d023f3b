use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use crate::dtos::NotificationDTO;

pub enum InternalSignal {
    Shutdown,
    Notification(NotificationDTO),
}

pub struct UserMap {
    users_online: DashMap<i64, UnboundedSender<InternalSignal>>,
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i64, tx: UnboundedSender<InternalSignal>) {
        info!("Registering user {} as online", user_id);
        // the latest connection receives the pushes, an older one keeps its own channel until it ends
        self.users_online.insert(user_id, tx);
        info!("Total online users: {}", self.users_online.len());
    }

    /// Unregisters the connection owning `tx`. A newer connection of the same
    /// user stays registered.
    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: &i64, tx: &UnboundedSender<InternalSignal>) {
        match self
            .users_online
            .remove_if(user_id, |_, registered| registered.same_channel(tx))
        {
            Some(_) => info!("Removing user from online"),
            None => debug!("Connection already replaced, user stays online"),
        }
    }

    /// Forwards the signal to the user's writer task. Returns `false` when the
    /// user is offline or the connection is gone.
    #[instrument(skip(self, message))]
    pub fn send_if_online(&self, user_id: &i64, message: InternalSignal) -> bool {
        let message_type = match &message {
            InternalSignal::Shutdown => "Shutdown",
            InternalSignal::Notification(n) => {
                debug!("Sending notification {}", n.notification_id);
                "Notification"
            }
        };

        let Some(entry) = self.users_online.get(user_id) else {
            debug!("User {} not online, {} not sent", user_id, message_type);
            return false;
        };

        match entry.value().send(message) {
            Ok(()) => {
                info!("{} sent to online user", message_type);
                true
            }
            Err(e) => {
                warn!("Failed to send {} to user: {:?}", message_type, e.0.kind_name());
                false
            }
        }
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: &i64) -> bool {
        self.users_online.contains_key(user_id)
    }
}

impl InternalSignal {
    fn kind_name(&self) -> &'static str {
        match self {
            InternalSignal::Shutdown => "Shutdown",
            InternalSignal::Notification(_) => "Notification",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NotificationKind;
    use chrono::Utc;
    use tokio::sync::mpsc::unbounded_channel;

    fn notification(id: i64) -> NotificationDTO {
        NotificationDTO {
            notification_id: id,
            kind: NotificationKind::RsvpReceived,
            message: "hello".to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_offline_user_gets_nothing() {
        let map = UserMap::new();
        assert!(!map.send_if_online(&7, InternalSignal::Notification(notification(1))));
        assert_eq!(map.online_count(), 0);
    }

    #[test]
    fn test_online_user_receives_signal() {
        let map = UserMap::new();
        let (tx, mut rx) = unbounded_channel();
        map.register_online(7, tx);
        assert!(map.is_user_online(&7));

        assert!(map.send_if_online(&7, InternalSignal::Notification(notification(3))));
        match rx.try_recv() {
            Ok(InternalSignal::Notification(n)) => assert_eq!(n.notification_id, 3),
            _ => panic!("expected a notification"),
        }

        map.remove_from_online(&7, &tx_of(&map, 7));
        assert!(!map.is_user_online(&7));
    }

    fn tx_of(map: &UserMap, user_id: i64) -> UnboundedSender<InternalSignal> {
        map.users_online.get(&user_id).expect("user is online").clone()
    }

    #[test]
    fn test_closing_old_connection_keeps_the_new_one() {
        let map = UserMap::new();
        let (old_tx, _old_rx) = unbounded_channel();
        let (new_tx, mut new_rx) = unbounded_channel();
        map.register_online(7, old_tx.clone());
        map.register_online(7, new_tx.clone());

        // the first socket ends after the second one connected
        map.remove_from_online(&7, &old_tx);
        assert!(map.is_user_online(&7));
        assert!(map.send_if_online(&7, InternalSignal::Notification(notification(4))));
        assert!(matches!(new_rx.try_recv(), Ok(InternalSignal::Notification(n)) if n.notification_id == 4));

        map.remove_from_online(&7, &new_tx);
        assert!(!map.is_user_online(&7));
    }

    #[test]
    fn test_closed_channel_reports_failure() {
        let map = UserMap::new();
        let (tx, rx) = unbounded_channel();
        map.register_online(9, tx);
        drop(rx);
        assert!(!map.send_if_online(&9, InternalSignal::Shutdown));
    }
}
