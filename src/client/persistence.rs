use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument};

use super::{
    api::{ApiError, ProfileApi},
    store::{AuthAction, SharedStore},
};
use crate::model::{ProfilePatch, User};

/// Sends profile patches and folds the server's answer into the store.
pub struct ProfileClient<A> {
    api: A,
    store: SharedStore,
    // FIFO: the server sees writes in the order they were issued.
    send_lock: AsyncMutex<()>,
}

impl<A: ProfileApi> ProfileClient<A> {
    pub fn new(api: A, store: SharedStore) -> Self {
        Self {
            api,
            store,
            send_lock: AsyncMutex::new(()),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// One network call, no retry. Does not touch the store.
    #[instrument(skip_all, fields(removal = patch.is_removal()))]
    pub async fn send(&self, patch: ProfilePatch) -> Result<User, ApiError> {
        let _turn = self.send_lock.lock().await;
        let user = self.api.update_profile(&patch).await?;
        debug!(user_id = %user.id, "profile update acknowledged");
        Ok(user)
    }

    /// Makes the server's record authoritative.
    pub fn reconcile(&self, user: User) {
        self.store.dispatch(AuthAction::ProfileConfirmed(user));
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<User, ApiError> {
        let user = self.send(patch).await?;
        self.reconcile(user.clone());
        Ok(user)
    }

    /// Re-reads the current user from the server.
    pub async fn refresh(&self) -> Result<User, ApiError> {
        let user = self.api.current_user().await?;
        self.store.dispatch(AuthAction::SignedIn(user.clone()));
        Ok(user)
    }
}
