//! Rasterization of a scene subtree with Cairo.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{task, time};
use url::Url;

use crate::config::CrossOriginMode;
use crate::draw::{self, ImageSet, color::WHITE};
use crate::export::{
    dependencies::Rasterizer,
    types::{CapturedBitmap, ExportError, ExportRequest},
};
use crate::scene::{PreparedTree, SceneHandle, prepare_for_capture};

/// Largest surface side Cairo can allocate.
const MAX_SURFACE_SIDE: f64 = 32767.0;

/// Renders keyed subtrees of the live scene.
pub struct CairoRasterizer {
    scene: SceneHandle,
}

impl CairoRasterizer {
    pub fn new(scene: SceneHandle) -> Self {
        Self { scene }
    }
}

#[async_trait]
impl Rasterizer for CairoRasterizer {
    async fn capture(&self, request: &ExportRequest) -> Result<CapturedBitmap, ExportError> {
        let target = self
            .scene
            .snapshot_target(&request.target_id)
            .ok_or_else(|| ExportError::MissingTarget(request.target_id.clone()))?;

        log::debug!(
            "Capturing '{}' ({:.0}x{:.0}) at scale {} ({})",
            request.target_id,
            target.bounds.width,
            target.bounds.height,
            request.profile.scale,
            request.profile.cross_origin
        );

        let prepared = prepare_for_capture(&target);
        let resources = load_resources(
            &prepared,
            self.scene.resource_root().as_deref(),
            request,
        )
        .await?;

        let scale = request.profile.scale;
        let mode = request.profile.cross_origin;
        let bitmap = task::spawn_blocking(move || rasterize(&prepared, resources, scale, mode))
            .await
            .map_err(|e| ExportError::Capture(format!("Render task failed: {}", e)))??;

        log::info!(
            "Rasterized '{}' to {}x{} ({} KB)",
            request.target_id,
            bitmap.width,
            bitmap.height,
            bitmap.data.len() / 1024
        );
        Ok(bitmap)
    }
}

/// Where an image source points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResourceLocation {
    Local(PathBuf),
    Remote(Url),
}

fn resolve_source(source: &str, resource_root: Option<&Path>) -> ResourceLocation {
    match Url::parse(source) {
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(path) => ResourceLocation::Local(path),
            Err(()) => ResourceLocation::Remote(url),
        },
        Ok(url) if url.cannot_be_a_base() && url.scheme().len() == 1 => {
            // Windows drive letters parse as a one-letter scheme.
            ResourceLocation::Local(PathBuf::from(source))
        }
        Ok(url) => ResourceLocation::Remote(url),
        Err(_) => {
            let path = PathBuf::from(source);
            match resource_root {
                Some(root) if path.is_relative() => ResourceLocation::Local(root.join(path)),
                _ => ResourceLocation::Local(path),
            }
        }
    }
}

/// Encoded bytes of every resource that loaded, keyed by source.
type LoadedResources = Vec<(String, Vec<u8>)>;

async fn load_resources(
    prepared: &PreparedTree,
    resource_root: Option<&Path>,
    request: &ExportRequest,
) -> Result<LoadedResources, ExportError> {
    let mode = request.profile.cross_origin;
    let budget = request.profile.timeout;

    let loads = prepared.root.image_sources().into_iter().map(|source| {
        let location = resolve_source(&source, resource_root);
        async move {
            let result = match &location {
                ResourceLocation::Remote(url) => Err(format!(
                    "cross-origin resource {} cannot be fetched",
                    url
                )),
                ResourceLocation::Local(path) => match time::timeout(budget, tokio::fs::read(path)).await {
                    Ok(Ok(bytes)) if !bytes.is_empty() => Ok(bytes),
                    Ok(Ok(_)) => Err(format!("resource {} is empty", path.display())),
                    Ok(Err(e)) => Err(format!("resource {} unreadable: {}", path.display(), e)),
                    Err(_) => Err(format!(
                        "resource {} not loaded within {:?}",
                        path.display(),
                        budget
                    )),
                },
            };
            (source, result)
        }
    });

    let mut loaded = Vec::new();
    for (source, result) in futures::future::join_all(loads).await {
        match result {
            Ok(bytes) => loaded.push((source, bytes)),
            Err(reason) if mode.is_strict() => return Err(ExportError::Capture(reason)),
            Err(reason) => log::warn!("Skipping image '{}': {}", source, reason),
        }
    }
    Ok(loaded)
}

/// Renders the prepared tree onto a white surface. Runs on a blocking thread.
fn rasterize(
    prepared: &PreparedTree,
    resources: LoadedResources,
    scale: f64,
    mode: CrossOriginMode,
) -> Result<CapturedBitmap, ExportError> {
    let width = (prepared.width * scale).ceil();
    let height = (prepared.height * scale).ceil();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(ExportError::Capture(format!(
            "target has no visible area ({}x{})",
            prepared.width, prepared.height
        )));
    }
    if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(ExportError::Capture(format!(
            "capture of {}x{} pixels exceeds the surface limit",
            width, height
        )));
    }

    let images = decode_images(resources, mode)?;

    let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width as i32, height as i32)
        .map_err(|e| ExportError::Capture(format!("Failed to create surface: {}", e)))?;
    {
        let ctx = cairo::Context::new(&surface)
            .map_err(|e| ExportError::Capture(format!("Failed to create context: {}", e)))?;
        ctx.scale(scale, scale);
        draw::render_background(&ctx, WHITE);
        draw::render_node(&ctx, &prepared.root, &images);
        if let Err(e) = ctx.status() {
            return Err(ExportError::Capture(format!("Rendering failed: {}", e)));
        }
    }
    surface.flush();

    let stride = surface.stride() as u32;
    let data = surface
        .data()
        .map_err(|e| ExportError::Capture(format!("Surface data unavailable: {}", e)))?
        .to_vec();

    Ok(CapturedBitmap {
        width: width as u32,
        height: height as u32,
        stride,
        data,
        scale,
    })
}

fn decode_images(resources: LoadedResources, mode: CrossOriginMode) -> Result<ImageSet, ExportError> {
    let mut images = ImageSet::new();
    for (source, bytes) in resources {
        match cairo::ImageSurface::create_from_png(&mut Cursor::new(bytes)) {
            Ok(surface) => {
                images.insert(source, surface);
            }
            Err(e) if mode.is_strict() => {
                return Err(ExportError::Capture(format!(
                    "image '{}' could not be decoded: {}",
                    source, e
                )));
            }
            Err(e) => log::warn!("Skipping undecodable image '{}': {}", source, e),
        }
    }
    Ok(images)
}
