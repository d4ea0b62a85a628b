//! Client side of the profile page: encoding, optimistic avatar state and
//! reconciliation with the server's record.

pub mod api;
pub mod avatar;
pub mod controller;
pub mod encoder;
pub mod persistence;
pub mod store;
pub mod view;

pub use api::{ApiError, HttpProfileApi, ProfileApi};
pub use avatar::{AvatarSource, AvatarState, Controls, Phase, Ticket, DEFAULT_PROFILE_PIC};
pub use controller::{AvatarController, AvatarError, Outcome};
pub use encoder::{EncodeError, EncodedImage, SelectedFile};
pub use persistence::ProfileClient;
pub use store::{AuthAction, AuthStore, SharedStore};
pub use view::ProfileView;
