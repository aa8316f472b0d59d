//! File delivery of encoded artifacts, with a viewer page as fallback.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::{process::Command, task, time};

use crate::config::Config;
use crate::export::{
    dependencies::DeliveryStrategy,
    types::{DeliveryOutcome, EncodedArtifact},
    viewer,
};

/// How long a launched viewer may take to report failure.
const VIEWER_LAUNCH_GRACE: Duration = Duration::from_secs(2);

static VIEWER_PAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Saves artifacts into a directory and falls back to opening a viewer page.
#[derive(Debug, Clone)]
pub struct FileDelivery {
    save_directory: PathBuf,
    cleanup_delay: Duration,
    viewer_command: String,
    viewer_cleanup_delay: Duration,
    viewer_directory: PathBuf,
}

impl FileDelivery {
    pub fn new(save_directory: PathBuf, cleanup_delay: Duration) -> Self {
        Self {
            save_directory,
            cleanup_delay,
            viewer_command: "xdg-open".to_string(),
            viewer_cleanup_delay: Duration::from_secs(60),
            viewer_directory: std::env::temp_dir(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output.save_path(),
            Duration::from_millis(config.output.cleanup_delay_ms),
        )
        .with_viewer(
            config.viewer.command.clone(),
            Duration::from_millis(config.viewer.cleanup_delay_ms),
        )
    }

    pub fn with_viewer(mut self, command: impl Into<String>, cleanup_delay: Duration) -> Self {
        self.viewer_command = command.into();
        self.viewer_cleanup_delay = cleanup_delay;
        self
    }

    /// Directory the viewer pages are written to (the system temp dir by default).
    pub fn with_viewer_directory(mut self, directory: PathBuf) -> Self {
        self.viewer_directory = directory;
        self
    }

    fn next_viewer_page(&self) -> PathBuf {
        let sequence = VIEWER_PAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.viewer_directory.join(format!(
            "panelshot-{}-{}-{}.html",
            Local::now().format("%Y%m%d%H%M%S"),
            std::process::id(),
            sequence
        ))
    }
}

#[async_trait]
impl DeliveryStrategy for FileDelivery {
    async fn deliver(&self, artifact: &EncodedArtifact, file_name: &str) -> DeliveryOutcome {
        let staging = staging_path(&self.save_directory, file_name);
        let directory = self.save_directory.clone();
        let file_name = file_name.to_string();
        let bytes = artifact.bytes.clone();
        let staging_for_save = staging.clone();

        let result =
            task::spawn_blocking(move || save_artifact(&bytes, &directory, &file_name, &staging_for_save))
                .await;

        // The staging file is normally consumed by the rename; release leftovers later.
        schedule_removal(staging, self.cleanup_delay);

        match result {
            Ok(Ok(path)) => DeliveryOutcome::saved(path),
            Ok(Err(e)) => {
                log::warn!("Saving artifact failed: {}", e);
                DeliveryOutcome::save_failed()
            }
            Err(e) => {
                log::warn!("Save task failed: {}", e);
                DeliveryOutcome::save_failed()
            }
        }
    }

    async fn show_for_manual_save(&self, artifact: &EncodedArtifact) -> DeliveryOutcome {
        let page = self.next_viewer_page();
        let html = viewer::render_viewer_page(artifact);

        if let Err(e) = tokio::fs::write(&page, html).await {
            log::warn!("Failed to write viewer page {}: {}", page.display(), e);
            return DeliveryOutcome::show_failed();
        }

        let spawned = Command::new(&self.viewer_command)
            .arg(&page)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let launched = match spawned {
            Ok(mut child) => match time::timeout(VIEWER_LAUNCH_GRACE, child.wait()).await {
                Ok(Ok(status)) if !status.success() => {
                    log::warn!("Viewer '{}' exited with {}", self.viewer_command, status);
                    false
                }
                Ok(Err(e)) => {
                    log::warn!("Failed to wait for viewer '{}': {}", self.viewer_command, e);
                    false
                }
                // Exited cleanly, or still running and showing the page.
                _ => true,
            },
            Err(e) => {
                log::warn!(
                    "Failed to launch viewer '{}' (is it installed?): {}",
                    self.viewer_command,
                    e
                );
                false
            }
        };

        if launched {
            log::info!("Opened viewer page {}", page.display());
            schedule_removal(page.clone(), self.viewer_cleanup_delay);
            DeliveryOutcome::shown(page)
        } else {
            schedule_removal(page, Duration::ZERO);
            DeliveryOutcome::show_failed()
        }
    }
}

/// Expands chrono format specifiers in the configured file name.
///
/// Names without an extension get `.png` appended.
pub fn generate_filename(template: &str) -> String {
    let mut name = String::new();
    if write!(name, "{}", Local::now().format(template)).is_err() {
        log::warn!("Invalid filename template '{}', using it verbatim", template);
        name = template.to_string();
    }

    if Path::new(&name).extension().is_none() {
        name.push_str(".png");
    }
    name
}

/// Ensure the save directory exists, creating it if necessary.
///
/// # Returns
/// The canonicalized path to the directory
pub fn ensure_directory_exists(directory: &Path) -> std::io::Result<PathBuf> {
    if !directory.exists() {
        log::info!("Creating save directory: {}", directory.display());
        fs::create_dir_all(directory)?;
    }

    Ok(directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf()))
}

fn staging_path(directory: &Path, file_name: &str) -> PathBuf {
    directory.join(format!(".{}.part", file_name))
}

/// Writes the staging file, then hands it over to the final name.
fn save_artifact(
    bytes: &[u8],
    directory: &Path,
    file_name: &str,
    staging: &Path,
) -> std::io::Result<PathBuf> {
    let directory = ensure_directory_exists(directory)?;
    let file_path = directory.join(file_name);

    log::info!(
        "Saving image to: {} ({} bytes)",
        file_path.display(),
        bytes.len()
    );

    fs::write(staging, bytes)?;

    // Set permissions to user read/write only
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staging, Permissions::from_mode(0o600))?;
    }

    fs::rename(staging, &file_path)?;

    let written_size = fs::metadata(&file_path)?.len();
    log::debug!("File written: {} bytes", written_size);

    Ok(file_path)
}

/// Removes `path` after `delay`, unless it is already gone.
fn schedule_removal(path: PathBuf, delay: Duration) {
    tokio::spawn(async move {
        time::sleep(delay).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::debug!("Released {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::types::{DeliveryChannel, PNG_MIME_TYPE};
    use tempfile::TempDir;

    fn artifact() -> EncodedArtifact {
        EncodedArtifact {
            bytes: vec![137, 80, 78, 71, 1, 2, 3],
            mime_type: PNG_MIME_TYPE,
            byte_length: 7,
            width: 2,
            height: 2,
            scale: 1.0,
        }
    }

    #[test]
    fn test_generate_filename() {
        assert_eq!(generate_filename("result.png"), "result.png");
        assert_eq!(generate_filename("result"), "result.png");

        let dated = generate_filename("result_%Y%m%d.png");
        assert!(dated.starts_with("result_20"));
        assert!(dated.ends_with(".png"));
    }

    #[tokio::test]
    async fn saves_into_new_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("out");
        let delivery = FileDelivery::new(dir.clone(), Duration::ZERO);

        let outcome = delivery.deliver(&artifact(), "result.png").await;

        assert_eq!(outcome.channel, DeliveryChannel::Saved);
        assert!(outcome.succeeded);
        let saved = outcome.location.unwrap();
        assert_eq!(saved.file_name().unwrap(), "result.png");
        assert_eq!(std::fs::read(&saved).unwrap(), artifact().bytes);
        assert!(!staging_path(&dir, "result.png").exists());
    }

    #[tokio::test]
    async fn save_failure_is_reported_not_raised() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let delivery = FileDelivery::new(blocker, Duration::ZERO);

        let outcome = delivery.deliver(&artifact(), "result.png").await;

        assert_eq!(outcome, DeliveryOutcome::save_failed());
    }

    #[tokio::test]
    async fn missing_viewer_reports_failure_and_removes_page() {
        let temp = TempDir::new().unwrap();
        let delivery = FileDelivery::new(temp.path().to_path_buf(), Duration::ZERO)
            .with_viewer("panelshot-no-such-viewer", Duration::ZERO)
            .with_viewer_directory(temp.path().to_path_buf());

        let outcome = delivery.show_for_manual_save(&artifact()).await;

        assert_eq!(outcome, DeliveryOutcome::show_failed());
        time::sleep(Duration::from_millis(50)).await;
        let pages = std::fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(pages, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn viewer_page_is_shown_with_inline_image() {
        let temp = TempDir::new().unwrap();
        let delivery = FileDelivery::new(temp.path().to_path_buf(), Duration::ZERO)
            .with_viewer("true", Duration::from_secs(60))
            .with_viewer_directory(temp.path().to_path_buf());

        let outcome = delivery.show_for_manual_save(&artifact()).await;

        assert_eq!(outcome.channel, DeliveryChannel::ShownForManualSave);
        assert!(outcome.succeeded);
        let page = std::fs::read_to_string(outcome.location.unwrap()).unwrap();
        assert!(page.contains("data:image/png;base64,"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_viewer_is_reported() {
        let temp = TempDir::new().unwrap();
        let delivery = FileDelivery::new(temp.path().to_path_buf(), Duration::ZERO)
            .with_viewer("false", Duration::ZERO)
            .with_viewer_directory(temp.path().to_path_buf());

        let outcome = delivery.show_for_manual_save(&artifact()).await;

        assert_eq!(outcome, DeliveryOutcome::show_failed());
    }
}
