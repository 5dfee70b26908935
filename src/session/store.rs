//! Current-user store shared by every page of the application

use tokio::sync::watch;
use tracing::debug;

use crate::api::User;

/// Handle to the logged-in user.
///
/// One store is created at the application root and cloned into the
/// components that need it. All clones observe the same value.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sender: watch::Sender<Option<User>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(None);
        Self { sender }
    }

    /// Replace the current user. Subscribers are notified even when the
    /// value is unchanged.
    pub fn set_current_user(&self, user: User) {
        debug!(user_id = user.id, username = %user.username, "session user updated");
        self.sender.send_replace(Some(user));
    }

    /// Forget the current user (logout)
    pub fn clear(&self) {
        debug!("session user cleared");
        self.sender.send_replace(None);
    }

    /// Snapshot of the current user
    pub fn current_user(&self) -> Option<User> {
        self.sender.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Receiver that wakes on every change
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.sender.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            username: name.to_string(),
            display_name: None,
            email: None,
            bio: None,
            created_at: None,
        }
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        assert!(!other.is_logged_in());

        store.set_current_user(user(1, "alice"));
        assert_eq!(other.current_user().unwrap().username, "alice");

        other.clear();
        assert!(store.current_user().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_notified_on_identical_value() {
        let store = SessionStore::new();
        store.set_current_user(user(1, "alice"));

        let mut receiver = store.subscribe();
        store.set_current_user(user(1, "alice"));

        assert!(receiver.has_changed().unwrap());
        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().as_ref().unwrap().id, 1);
    }
}
