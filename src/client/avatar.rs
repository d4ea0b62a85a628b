//! Avatar state for the profile page.
//!
//! Every user action takes a [`Ticket`]. Only the holder of the latest
//! ticket may move the machine forward, so results from superseded
//! actions are dropped instead of racing the newer one.

use tracing::debug;

use super::encoder::EncodedImage;
use crate::model::User;

/// Shown when neither a local preview nor a stored picture exists.
pub const DEFAULT_PROFILE_PIC: &str = "/avatar.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Encoding,
    Uploading,
}

/// What the avatar `<img>` should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarSource<'a> {
    Preview(&'a str),
    Stored(&'a str),
    Default,
}

impl<'a> AvatarSource<'a> {
    pub fn src(&self) -> &'a str {
        match self {
            Self::Preview(s) | Self::Stored(s) => s,
            Self::Default => DEFAULT_PROFILE_PIC,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

/// Camera (upload) and trash (remove) affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub camera_enabled: bool,
    pub trash_visible: bool,
    pub trash_enabled: bool,
}

#[derive(Debug, Default)]
pub struct AvatarState {
    local_preview: Option<EncodedImage>,
    // Ticket whose upload put `local_preview` on screen.
    preview_owner: Option<Ticket>,
    phase: Phase,
    preview_open: bool,
    issued: u64,
    // Most recent ticket handed to the network. Sends are FIFO, so its
    // answer is what the server ends up holding.
    last_sent: Option<Ticket>,
    outstanding: usize,
    last_error: Option<String>,
}

impl AvatarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while any request is outstanding, including ones a newer
    /// action has superseded.
    pub fn in_flight(&self) -> bool {
        self.outstanding > 0
    }

    pub fn local_preview(&self) -> Option<&EncodedImage> {
        self.local_preview.as_ref()
    }

    pub fn preview_open(&self) -> bool {
        self.preview_open
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    fn issue(&mut self) -> Ticket {
        self.issued += 1;
        self.last_error = None;
        Ticket(self.issued)
    }

    fn dispatched(&mut self, ticket: Ticket) {
        self.last_sent = Some(ticket);
        self.outstanding += 1;
        self.phase = Phase::Uploading;
    }

    fn settle(&mut self, ticket: Ticket) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.preview_owner == Some(ticket) {
            self.local_preview = None;
            self.preview_owner = None;
        }
    }

    /// A file was picked; encoding starts.
    pub fn begin_select(&mut self) -> Ticket {
        let ticket = self.issue();
        self.phase = Phase::Encoding;
        debug!(ticket = ticket.0, "avatar encoding");
        ticket
    }

    /// Applies the encoded image optimistically. Returns `false` if the
    /// ticket was superseded, in which case nothing changes and the image
    /// must not be persisted.
    pub fn encoding_finished(&mut self, ticket: Ticket, image: EncodedImage) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "stale encode dropped");
            return false;
        }
        self.local_preview = Some(image);
        self.preview_owner = Some(ticket);
        self.dispatched(ticket);
        true
    }

    pub fn encoding_failed(&mut self, ticket: Ticket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = Phase::Idle;
        self.last_error = Some(message.into());
        true
    }

    /// Removal: the preview goes away at once, the request follows.
    pub fn begin_remove(&mut self) -> Ticket {
        let ticket = self.issue();
        self.local_preview = None;
        self.preview_owner = None;
        self.dispatched(ticket);
        debug!(ticket = ticket.0, "avatar removal");
        ticket
    }

    /// Server acknowledged. Every dispatched ticket must settle exactly
    /// once, through this or [`Self::persist_failed`].
    ///
    /// Returns `true` when the caller should commit the returned user: the
    /// ticket is current, or it was the last one sent and whatever came
    /// after it never reached the network.
    pub fn persist_succeeded(&mut self, ticket: Ticket) -> bool {
        self.settle(ticket);
        let current = self.is_current(ticket);
        if !current && self.last_sent != Some(ticket) {
            debug!(ticket = ticket.0, "stale response dropped");
            return false;
        }
        if current {
            self.phase = Phase::Idle;
        }
        true
    }

    /// Server call failed. The preview this ticket put up is rolled back,
    /// stale or not, so a rejected image never stays on screen. Returns
    /// `false` for a superseded ticket, whose error is not reported.
    pub fn persist_failed(&mut self, ticket: Ticket, message: impl Into<String>) -> bool {
        self.settle(ticket);
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "stale failure dropped");
            return false;
        }
        self.phase = Phase::Idle;
        self.last_error = Some(message.into());
        true
    }

    pub fn open_preview(&mut self) {
        self.preview_open = true;
    }

    pub fn close_preview(&mut self) {
        self.preview_open = false;
    }

    /// Local preview, then the stored picture, then the default.
    pub fn display<'a>(&'a self, user: Option<&'a User>) -> AvatarSource<'a> {
        if let Some(local) = &self.local_preview {
            return AvatarSource::Preview(local.as_str());
        }
        match user.and_then(|u| u.profile_pic.as_deref()) {
            Some(pic) if !pic.is_empty() => AvatarSource::Stored(pic),
            _ => AvatarSource::Default,
        }
    }

    pub fn controls(&self, user: Option<&User>) -> Controls {
        let busy = self.in_flight();
        Controls {
            camera_enabled: !busy,
            trash_visible: !self.display(user).is_default(),
            trash_enabled: !busy,
        }
    }
}
