use std::sync::Arc;

use tokio::task;

use crate::export::{
    dependencies::{Encoder, ExportDependencies},
    types::{
        ArtifactInfo, CapturedBitmap, DeliveryOutcome, EncodedArtifact, ExportError,
        ExportRequest,
    },
};

/// What a successful attempt leaves behind once the payload is dropped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttemptSuccess {
    pub(crate) artifact: ArtifactInfo,
    pub(crate) delivery: DeliveryOutcome,
}

/// Runs rasterize → encode → deliver once.
///
/// Delivery tries the save path first and the manual-save viewer second; when
/// both fail the attempt fails with [`ExportError::SaveUnsupported`].
pub(crate) async fn run_attempt(
    request: &ExportRequest,
    dependencies: &ExportDependencies,
    file_name: &str,
) -> Result<AttemptSuccess, ExportError> {
    log::info!(
        "Starting capture of '{}' (scale {}, {}, timeout {:?})",
        request.target_id,
        request.profile.scale,
        request.profile.cross_origin,
        request.profile.timeout
    );

    let bitmap = dependencies.rasterizer.capture(request).await?;
    let artifact = encode(Arc::clone(&dependencies.encoder), bitmap).await?;
    if artifact.byte_length == 0 || artifact.bytes.is_empty() {
        return Err(ExportError::Encoding("artifact is empty".to_string()));
    }

    log::info!(
        "Encoded {}x{} image ({} KB)",
        artifact.width,
        artifact.height,
        artifact.byte_length / 1024
    );

    let delivery = deliver(dependencies, &artifact, file_name).await?;

    Ok(AttemptSuccess {
        artifact: artifact.info(),
        delivery,
    })
}

async fn encode(
    encoder: Arc<dyn Encoder>,
    bitmap: CapturedBitmap,
) -> Result<EncodedArtifact, ExportError> {
    task::spawn_blocking(move || encoder.encode(bitmap))
        .await
        .map_err(|e| ExportError::Encoding(format!("Encode task failed: {}", e)))?
}

async fn deliver(
    dependencies: &ExportDependencies,
    artifact: &EncodedArtifact,
    file_name: &str,
) -> Result<DeliveryOutcome, ExportError> {
    let saved = dependencies.delivery.deliver(artifact, file_name).await;
    if saved.succeeded {
        return Ok(saved);
    }

    log::warn!("Saving '{}' failed, opening the image for manual save", file_name);
    let shown = dependencies.delivery.show_for_manual_save(artifact).await;
    if shown.succeeded {
        Ok(shown)
    } else {
        Err(ExportError::SaveUnsupported(
            "the image could neither be saved nor shown".to_string(),
        ))
    }
}
