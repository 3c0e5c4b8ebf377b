use crate::api::{Notification, User};

/// Everything the ui keeps about the logged-in user. Built once after
/// authentication and passed down explicitly to the components that need it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub user: User,

    /// Newest first
    pub notifications: Vec<Notification>,

    /// Direct messages pushed while the messages view was not open
    pub unread_messages: usize,
}

impl Session {
    pub fn new(user: User) -> Session {
        Session {
            user,
            notifications: Vec::new(),
            unread_messages: 0,
        }
    }

    pub fn stub() -> Session {
        Session::new(User::stub())
    }

    /// Replaces the whole list, eg. with the bootstrap fetch after connecting
    pub fn set_notifications(&mut self, mut notifications: Vec<Notification>) {
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.notifications = notifications;
    }

    /// Applies one realtime push. Reconnections replay recent notifications,
    /// so an already-known id is dropped.
    pub fn add_notification(&mut self, n: Notification) {
        if self.notifications.iter().any(|known| known.id == n.id) {
            return;
        }
        self.notifications.insert(0, n);
    }

    pub fn unseen_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.seen).count()
    }

    pub fn mark_all_seen(&mut self) {
        for n in &mut self.notifications {
            n.seen = true;
        }
    }

    pub fn note_message_received(&mut self) {
        self.unread_messages += 1;
    }

    pub fn clear_unread_messages(&mut self) {
        self.unread_messages = 0;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::api::{self, NotificationKind, Uuid};

    fn notification(seen: bool) -> Notification {
        Notification {
            id: api::NotificationId(Uuid::new_v4()),
            actor: User::stub(),
            recipient: api::UserId::stub(),
            kind: NotificationKind::NewFollower,
            seen,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn replayed_notifications_are_deduplicated() {
        let mut session = Session::stub();
        let n = notification(false);
        session.add_notification(n.clone());
        session.add_notification(n.clone());
        assert_eq!(session.notifications, vec![n]);
    }

    #[test]
    fn unseen_count_follows_mark_all_seen() {
        let mut session = Session::stub();
        session.set_notifications(vec![notification(false), notification(true)]);
        assert_eq!(session.unseen_notifications(), 1);

        session.add_notification(notification(false));
        assert_eq!(session.unseen_notifications(), 2);

        session.mark_all_seen();
        assert_eq!(session.unseen_notifications(), 0);
        assert_eq!(session.notifications.len(), 3);
    }

    #[test]
    fn fresh_pushes_go_to_the_front() {
        let mut session = Session::stub();
        session.set_notifications(vec![notification(true)]);
        let fresh = notification(false);
        session.add_notification(fresh.clone());
        assert_eq!(session.notifications[0], fresh);
    }

    #[test]
    fn unread_messages_accumulate_until_cleared() {
        let mut session = Session::stub();
        session.note_message_received();
        session.note_message_received();
        assert_eq!(session.unread_messages, 2);

        session.clear_unread_messages();
        assert_eq!(session.unread_messages, 0);
    }
}
