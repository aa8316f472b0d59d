use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::export::{
    delivery::FileDelivery,
    encode::PngEncoder,
    raster::CairoRasterizer,
    readiness::SceneHost,
    types::{CapturedBitmap, DeliveryOutcome, EncodedArtifact, ExportError, ExportRequest},
};
use crate::notification::{DesktopNotifier, LogNotifier, Notice};
use crate::scene::SceneHandle;

/// Host-side signals the readiness gate waits on.
#[async_trait]
pub trait RenderHost: Send + Sync {
    /// Resolves once pending typefaces are loaded.
    async fn fonts_ready(&self) -> Result<(), String>;

    /// Resolves at the next frame boundary.
    async fn next_frame(&self);
}

/// Converts the target subtree into pixels.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn capture(&self, request: &ExportRequest) -> Result<CapturedBitmap, ExportError>;
}

/// Converts pixels into a portable image payload. Called on a blocking thread.
pub trait Encoder: Send + Sync {
    fn encode(&self, bitmap: CapturedBitmap) -> Result<EncodedArtifact, ExportError>;
}

/// Hands artifacts to the user. Neither method fails; failures are reported
/// through [`DeliveryOutcome::succeeded`].
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    /// Saves the artifact under `file_name`.
    async fn deliver(&self, artifact: &EncodedArtifact, file_name: &str) -> DeliveryOutcome;

    /// Shows the artifact so the user can save it by hand.
    async fn show_for_manual_save(&self, artifact: &EncodedArtifact) -> DeliveryOutcome;
}

/// Surfaces export outcomes to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice);
}

/// Bundle of dependencies used by the export pipeline. Each component can be mocked in tests.
#[derive(Clone)]
pub struct ExportDependencies {
    pub host: Arc<dyn RenderHost>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub encoder: Arc<dyn Encoder>,
    pub delivery: Arc<dyn DeliveryStrategy>,
    pub notifier: Arc<dyn Notifier>,
}

impl ExportDependencies {
    /// Production dependencies rendering from `scene`.
    pub fn for_scene(scene: SceneHandle, config: &Config) -> Self {
        let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
            Arc::new(DesktopNotifier)
        } else {
            Arc::new(LogNotifier)
        };

        Self {
            host: Arc::new(SceneHost::new(scene.clone(), &config.readiness)),
            rasterizer: Arc::new(CairoRasterizer::new(scene)),
            encoder: Arc::new(PngEncoder),
            delivery: Arc::new(FileDelivery::from_config(config)),
            notifier,
        }
    }
}
