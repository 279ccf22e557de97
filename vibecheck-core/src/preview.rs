//! 30-second preview playback. At most one preview is audible at a time.

use crate::error::PreviewError;
use crate::notice::NoticeBoard;
use tracing::{debug, info, warn};

const MSG_PLAY_FAILED: &str = "Could not play preview. Click the Spotify button to listen on Spotify.";

/// Something that can play a remote audio clip.
pub trait AudioBackend: Send {
    /// Begin playing `source_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if playback could not start.
    fn start(&mut self, source_url: &str) -> Result<(), PreviewError>;

    /// Halt playback. Safe to call when idle.
    fn stop(&mut self);

    /// Whether the clip started last has run to its end.
    fn has_finished(&mut self) -> bool;
}

/// Render state of one play control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// The control was already playing and has been stopped
    Paused,
    /// No preview URL; a notice was posted
    NoPreview,
    /// Playback failed to start; a notice was posted
    Failed,
}

#[derive(Debug, Clone)]
struct ActivePreview {
    control: String,
    source_url: String,
    title: String,
}

/// The single preview player shared by every track row.
pub struct AudioPreviewController {
    backend: Box<dyn AudioBackend>,
    active: Option<ActivePreview>,
    notices: NoticeBoard,
}

impl AudioPreviewController {
    pub fn new(backend: Box<dyn AudioBackend>, notices: NoticeBoard) -> Self {
        Self {
            backend,
            active: None,
            notices,
        }
    }

    /// Press the play control `control` for a track.
    ///
    /// Pressing the active control stops it. Otherwise any other preview is
    /// stopped before `source_url` starts.
    pub fn play(&mut self, source_url: Option<&str>, control: &str, title: &str) -> PlayOutcome {
        if self.is_active(control) {
            info!("Pausing preview for {}", title);
            self.stop();
            return PlayOutcome::Paused;
        }

        let Some(source_url) = source_url.filter(|u| !u.is_empty()) else {
            self.notices
                .post(format!("No preview available for \"{title}\""));
            return PlayOutcome::NoPreview;
        };

        if self.active.is_some() {
            self.stop();
        }

        match self.backend.start(source_url) {
            Ok(()) => {
                info!("Playing preview for {}", title);
                self.active = Some(ActivePreview {
                    control: control.to_string(),
                    source_url: source_url.to_string(),
                    title: title.to_string(),
                });
                PlayOutcome::Started
            }
            Err(e) => {
                warn!("Preview playback failed for {}: {}", title, e);
                self.reset();
                self.notices.post(MSG_PLAY_FAILED);
                PlayOutcome::Failed
            }
        }
    }

    /// Halt playback and return every control to idle.
    pub fn stop(&mut self) {
        self.backend.stop();
        self.reset();
    }

    /// Detect the natural end of the clip. Returns whether it just ended.
    pub fn poll(&mut self) -> bool {
        if self.active.is_none() || !self.backend.has_finished() {
            return false;
        }
        debug!("Preview ended");
        self.stop();
        true
    }

    #[must_use]
    pub fn control_state(&self, control: &str) -> ControlState {
        if self.is_active(control) {
            ControlState::Playing
        } else {
            ControlState::Idle
        }
    }

    /// Title of the playing track.
    #[must_use]
    pub fn now_playing(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.title.as_str())
    }

    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.source_url.as_str())
    }

    pub fn notices(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    fn is_active(&self, control: &str) -> bool {
        self.active.as_ref().is_some_and(|a| a.control == control)
    }

    fn reset(&mut self) {
        self.active = None;
    }
}
