//! Preview playback through an external media player process.

use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};
use vibecheck_core::{AudioBackend, PreviewConfig, PreviewError};

/// Runs `<player> <player_args...> <url>` for each preview.
pub struct ProcessBackend {
    player: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl ProcessBackend {
    pub fn new(player: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            player: player.into(),
            args,
            child: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(config.player.clone(), config.player_args.clone())
    }
}

impl AudioBackend for ProcessBackend {
    fn start(&mut self, source_url: &str) -> Result<(), PreviewError> {
        if source_url.is_empty() {
            return Err(PreviewError::NoSource);
        }
        self.stop();

        let child = Command::new(&self.player)
            .args(&self.args)
            .arg(source_url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PreviewError::StartFailed {
                player: self.player.clone(),
                reason: e.to_string(),
            })?;

        info!("Started {} (pid {})", self.player, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                // Already exited
                debug!("Kill preview player: {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("Failed to reap preview player: {}", e);
            }
        }
    }

    fn has_finished(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Preview player exited: {}", status);
                self.child = None;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to poll preview player: {}", e);
                self.child = None;
                true
            }
        }
    }
}

impl Drop for ProcessBackend {
    fn drop(&mut self) {
        self.stop();
    }
}
