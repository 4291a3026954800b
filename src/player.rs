use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// What is playing right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
  pub title: String,
}

/// External `mpv` process playing a stream URL.
#[derive(Default)]
pub struct MediaPlayer {
  process: Option<Child>,
  pub now_playing: Option<NowPlaying>,
}

impl MediaPlayer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_playing(&self) -> bool {
    self.process.is_some()
  }

  pub async fn play(&mut self, title: &str, url: &str) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let child = Command::new("mpv")
      .args(["--really-quiet", &format!("--force-media-title={}", title), "--", url])
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
          anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
        } else {
          anyhow!(e).context("Failed to spawn mpv process")
        }
      })?;

    info!(url = %url, "player: mpv started");
    self.process = Some(child);
    self.now_playing = Some(NowPlaying { title: title.to_string() });
    Ok(())
  }

  /// Forget the process once mpv exits on its own (window closed, stream ended).
  pub fn reap(&mut self) {
    if let Some(child) = self.process.as_mut() {
      match child.try_wait() {
        Ok(Some(status)) => {
          info!(%status, "player: mpv exited");
          self.process = None;
          self.now_playing = None;
        }
        Ok(None) => {}
        Err(e) => warn!(err = %e, "player: failed to poll mpv"),
      }
    }
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(mut child) = self.process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }
    self.now_playing = None;
    Ok(())
  }
}

/// Open a URL in the system browser without blocking the UI.
pub fn open_url(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to run {}", cmd))?;
  // Reap in the background so the child doesn't linger as a zombie.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}
