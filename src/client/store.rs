use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::model::User;

/// Every change to the cached user goes through one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    SignedIn(User),
    ProfileConfirmed(User),
    SignedOut,
}

/// Session-lifetime cache of the authenticated user.
#[derive(Debug, Default)]
pub struct AuthStore {
    auth_user: Option<User>,
    revision: u64,
}

impl AuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        let mut store = Self::new();
        store.dispatch(AuthAction::SignedIn(user));
        store
    }

    pub fn auth_user(&self) -> Option<&User> {
        self.auth_user.as_ref()
    }

    /// Bumped on every dispatch.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn dispatch(&mut self, action: AuthAction) {
        self.revision += 1;
        match action {
            AuthAction::SignedIn(user) => {
                debug!(user_id = %user.id, revision = self.revision, "auth user set");
                self.auth_user = Some(user);
            }
            AuthAction::ProfileConfirmed(user) => {
                // A confirmation for someone else means the session changed underneath us.
                if self.auth_user.as_ref().is_some_and(|u| u.id != user.id) {
                    debug!(user_id = %user.id, "ignoring confirmation for another user");
                    return;
                }
                debug!(user_id = %user.id, revision = self.revision, "profile confirmed");
                self.auth_user = Some(user);
            }
            AuthAction::SignedOut => {
                debug!(revision = self.revision, "auth user cleared");
                self.auth_user = None;
            }
        }
    }
}

/// Handle shared between the page and the persistence client.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<Mutex<AuthStore>>);

impl SharedStore {
    pub fn new(store: AuthStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn dispatch(&self, action: AuthAction) {
        self.lock().dispatch(action);
    }

    pub fn auth_user(&self) -> Option<User> {
        self.lock().auth_user().cloned()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    fn lock(&self) -> MutexGuard<'_, AuthStore> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn user(pic: Option<&str>) -> User {
        User {
            id: Uuid::from_u128(7),
            full_name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            profile_pic: pic.map(Into::into),
            created_at: datetime!(2023-11-05 08:30 UTC),
        }
    }

    #[test]
    fn confirmation_overwrites_profile_pic() {
        let mut store = AuthStore::signed_in(user(Some("https://cdn/old.png")));
        store.dispatch(AuthAction::ProfileConfirmed(user(Some("https://cdn/new.png"))));
        assert_eq!(
            store.auth_user().unwrap().profile_pic.as_deref(),
            Some("https://cdn/new.png")
        );
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn confirmation_for_other_user_is_ignored() {
        let mut store = AuthStore::signed_in(user(None));
        let mut other = user(Some("x"));
        other.id = Uuid::from_u128(8);
        store.dispatch(AuthAction::ProfileConfirmed(other));
        assert_eq!(store.auth_user().unwrap().id, Uuid::from_u128(7));
        assert!(store.auth_user().unwrap().profile_pic.is_none());
    }

    #[test]
    fn sign_out_clears_user() {
        let shared = SharedStore::new(AuthStore::signed_in(user(None)));
        shared.dispatch(AuthAction::SignedOut);
        assert!(shared.auth_user().is_none());
        assert_eq!(shared.revision(), 2);
    }
}
