use time::macros::format_description;

use super::avatar::{AvatarState, Controls};
use crate::model::User;

/// Everything the profile page renders, computed from the store and the
/// avatar state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub full_name: String,
    pub email: String,
    pub joined_on: String,
    pub account_status: &'static str,
    pub avatar_src: String,
    pub has_picture: bool,
    pub controls: Controls,
    pub status_line: &'static str,
    pub preview_open: bool,
}

impl ProfileView {
    pub fn build(user: &User, avatar: &AvatarState) -> Self {
        let display = avatar.display(Some(user));
        let joined_on = user
            .created_at
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            joined_on,
            account_status: "Active",
            avatar_src: display.src().to_string(),
            has_picture: !display.is_default(),
            controls: avatar.controls(Some(user)),
            status_line: if avatar.in_flight() {
                "Uploading..."
            } else {
                "Click the camera icon to update your photo"
            },
            preview_open: avatar.preview_open(),
        }
    }
}
