use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::{
    api::{ApiError, ProfileApi},
    avatar::{AvatarState, Controls, Phase, Ticket},
    encoder::{self, EncodeError, SelectedFile},
    persistence::ProfileClient,
    store::SharedStore,
    view::ProfileView,
};
use crate::model::{ProfilePatch, User};

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("profile update failed")]
    Persist(#[from] ApiError),
}

/// How an action ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server's record was committed to the store.
    Committed(User),
    /// A newer action took over; this one's result, success or failure,
    /// was discarded.
    Superseded,
}

/// Drives [`AvatarState`] with real encoder and network results.
pub struct AvatarController<A> {
    client: ProfileClient<A>,
    // Never held across an await. Lock order: state, then store.
    state: Mutex<AvatarState>,
}

impl<A: ProfileApi> AvatarController<A> {
    pub fn new(api: A, store: SharedStore) -> Self {
        Self {
            client: ProfileClient::new(api, store),
            state: Mutex::new(AvatarState::new()),
        }
    }

    pub fn client(&self) -> &ProfileClient<A> {
        &self.client
    }

    #[instrument(skip_all, fields(file = %file.name()))]
    pub async fn select_file(&self, file: SelectedFile) -> Result<Outcome, AvatarError> {
        let ticket = self.state().begin_select();

        let image = match encoder::encode(&file).await {
            Ok(image) => image,
            Err(e) => {
                if !self.state().encoding_failed(ticket, e.to_string()) {
                    debug!(error = %e, "superseded file could not be encoded");
                    return Ok(Outcome::Superseded);
                }
                warn!(error = %e, "could not encode selected file");
                return Err(e.into());
            }
        };

        let patch = ProfilePatch::replace(image.as_str());
        if !self.state().encoding_finished(ticket, image) {
            return Ok(Outcome::Superseded);
        }
        self.persist(ticket, patch).await
    }

    #[instrument(skip_all)]
    pub async fn remove_avatar(&self) -> Result<Outcome, AvatarError> {
        let ticket = self.state().begin_remove();
        self.persist(ticket, ProfilePatch::remove()).await
    }

    pub fn open_preview(&self) {
        self.state().open_preview();
    }

    pub fn close_preview(&self) {
        self.state().close_preview();
    }

    pub fn phase(&self) -> Phase {
        self.state().phase()
    }

    pub fn in_flight(&self) -> bool {
        self.state().in_flight()
    }

    pub fn preview_open(&self) -> bool {
        self.state().preview_open()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error().map(str::to_string)
    }

    /// Source the avatar image should currently load.
    pub fn display_src(&self) -> String {
        let user = self.client.store().auth_user();
        self.state().display(user.as_ref()).src().to_string()
    }

    pub fn controls(&self) -> Controls {
        let user = self.client.store().auth_user();
        self.state().controls(user.as_ref())
    }

    /// Snapshot for rendering; `None` until someone is signed in.
    pub fn view(&self) -> Option<ProfileView> {
        let user = self.client.store().auth_user()?;
        Some(ProfileView::build(&user, &self.state()))
    }

    async fn persist(&self, ticket: Ticket, patch: ProfilePatch) -> Result<Outcome, AvatarError> {
        match self.client.send(patch).await {
            Ok(user) => {
                let mut state = self.state();
                if !state.persist_succeeded(ticket) {
                    return Ok(Outcome::Superseded);
                }
                self.client.reconcile(user.clone());
                info!(user_id = %user.id, "avatar committed");
                Ok(Outcome::Committed(user))
            }
            Err(e) => {
                if !self.state().persist_failed(ticket, e.to_string()) {
                    debug!(error = %e, "superseded avatar update failed");
                    return Ok(Outcome::Superseded);
                }
                warn!(error = %e, "avatar update failed");
                Err(e.into())
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, AvatarState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
