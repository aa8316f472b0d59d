//! Bounded wait until the capture target is safe to rasterize.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};

use crate::config::ReadinessConfig;
use crate::export::dependencies::RenderHost;
use crate::scene::SceneHandle;

/// Lower bound for a single frame boundary wait.
const MIN_FRAME_WAIT: Duration = Duration::from_millis(250);

/// How long each readiness step may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessTimings {
    pub font_timeout: Duration,
    pub font_settle: Duration,
    pub animation_settle: Duration,
    /// Bound for each of the two frame boundary waits.
    pub frame_wait: Duration,
}

impl From<&ReadinessConfig> for ReadinessTimings {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            font_timeout: Duration::from_millis(config.font_timeout_ms),
            font_settle: Duration::from_millis(config.font_settle_ms),
            animation_settle: Duration::from_millis(config.animation_settle_ms),
            frame_wait: frame_wait_for(Duration::from_millis(config.frame_interval_ms)),
        }
    }
}

/// A frame wait must cover at least one full interval of the frame clock.
fn frame_wait_for(frame_interval: Duration) -> Duration {
    (frame_interval * 2).max(MIN_FRAME_WAIT)
}

impl Default for ReadinessTimings {
    fn default() -> Self {
        Self::from(&ReadinessConfig::default())
    }
}

impl ReadinessTimings {
    /// No settle waits; only the frame barrier remains.
    pub fn immediate() -> Self {
        Self {
            font_timeout: Duration::ZERO,
            font_settle: Duration::ZERO,
            animation_settle: Duration::ZERO,
            frame_wait: MIN_FRAME_WAIT,
        }
    }
}

/// Waits for fonts, animations and two frame boundaries, in that order.
pub struct ReadinessGate<'a> {
    host: &'a dyn RenderHost,
    timings: ReadinessTimings,
}

impl<'a> ReadinessGate<'a> {
    pub fn new(host: &'a dyn RenderHost, timings: ReadinessTimings) -> Self {
        Self { host, timings }
    }

    /// Never fails: a stalled or failing step is logged and skipped.
    pub async fn await_readiness(&self) {
        let started = Instant::now();

        match time::timeout(self.timings.font_timeout, self.host.fonts_ready()).await {
            Ok(Ok(())) => {
                log::debug!("Fonts ready");
                time::sleep(self.timings.font_settle).await;
            }
            Ok(Err(e)) => log::warn!("Font loading failed, continuing: {}", e),
            Err(_) => log::warn!(
                "Fonts not ready after {:?}, continuing",
                self.timings.font_timeout
            ),
        }

        log::debug!(
            "Waiting {:?} for animations to settle",
            self.timings.animation_settle
        );
        time::sleep(self.timings.animation_settle).await;

        for _ in 0..2 {
            if time::timeout(self.timings.frame_wait, self.host.next_frame())
                .await
                .is_err()
            {
                log::warn!(
                    "Frame boundary not reached within {:?}",
                    self.timings.frame_wait
                );
            }
        }

        log::info!("Render state ready after {:?}", started.elapsed());
    }
}

/// [`RenderHost`] backed by the live scene and a fixed-rate frame clock.
pub struct SceneHost {
    scene: SceneHandle,
    epoch: Instant,
    frame_interval: Duration,
}

impl SceneHost {
    pub fn new(scene: SceneHandle, config: &ReadinessConfig) -> Self {
        Self {
            scene,
            epoch: Instant::now(),
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
        }
    }
}

#[async_trait]
impl RenderHost for SceneHost {
    async fn fonts_ready(&self) -> Result<(), String> {
        let families = self.scene.font_families();
        if families.is_empty() {
            return Ok(());
        }

        tokio::task::spawn_blocking(move || load_font_families(families))
            .await
            .map_err(|e| format!("Font loading task failed: {}", e))?
    }

    async fn next_frame(&self) {
        let interval = self.frame_interval.as_nanos().max(1);
        let elapsed = self.epoch.elapsed().as_nanos();
        let frames = elapsed / interval + 1;
        let boundary = self.epoch + Duration::from_nanos((frames * interval) as u64);
        time::sleep_until(boundary).await;
    }
}

/// Resolves each family through the Pango font map, which loads it via fontconfig.
fn load_font_families(families: impl IntoIterator<Item = String>) -> Result<(), String> {
    use pango::prelude::*;

    let font_map = pangocairo::FontMap::default();
    let context = font_map.create_context();
    let missing: Vec<String> = families
        .into_iter()
        .filter(|family| {
            let desc = pango::FontDescription::from_string(family);
            font_map.load_font(&context, &desc).is_none()
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Could not load font families: {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum FontBehavior {
        Ready,
        Fails,
        Stalls,
    }

    struct MockHost {
        fonts: FontBehavior,
        frames: Arc<Mutex<Vec<Instant>>>,
    }

    impl MockHost {
        fn new(fonts: FontBehavior) -> Self {
            Self {
                fonts,
                frames: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl RenderHost for MockHost {
        async fn fonts_ready(&self) -> Result<(), String> {
            match self.fonts {
                FontBehavior::Ready => Ok(()),
                FontBehavior::Fails => Err("font server unavailable".to_string()),
                FontBehavior::Stalls => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }

        async fn next_frame(&self) {
            time::sleep(Duration::from_millis(16)).await;
            self.frames.lock().unwrap().push(Instant::now());
        }
    }

    fn timings() -> ReadinessTimings {
        ReadinessTimings {
            font_timeout: Duration::from_millis(3000),
            font_settle: Duration::from_millis(500),
            animation_settle: Duration::from_millis(4000),
            frame_wait: MIN_FRAME_WAIT,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_fonts_settle_and_two_frames() {
        let host = MockHost::new(FontBehavior::Ready);
        let start = Instant::now();

        ReadinessGate::new(&host, timings()).await_readiness().await;

        assert_eq!(start.elapsed(), Duration::from_millis(500 + 4000 + 32));
        assert_eq!(host.frames.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn font_failure_proceeds_without_settle_pause() {
        let host = MockHost::new(FontBehavior::Fails);
        let start = Instant::now();

        ReadinessGate::new(&host, timings()).await_readiness().await;

        assert_eq!(start.elapsed(), Duration::from_millis(4000 + 32));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fonts_are_bounded_by_timeout() {
        let host = MockHost::new(FontBehavior::Stalls);
        let start = Instant::now();

        ReadinessGate::new(&host, timings()).await_readiness().await;

        assert_eq!(start.elapsed(), Duration::from_millis(3000 + 4000 + 32));
        assert_eq!(host.frames.lock().unwrap().len(), 2);
    }

    fn empty_scene() -> SceneHandle {
        SceneHandle::new(crate::scene::Scene::new(crate::scene::Node::new(
            crate::scene::Bounds::new(0.0, 0.0, 10.0, 10.0),
            crate::scene::NodeKind::Container {
                background: None,
                corner_radius: 0.0,
                border: None,
            },
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn scene_host_frames_land_on_interval_boundaries() {
        let scene = empty_scene();
        let config = ReadinessConfig {
            frame_interval_ms: 20,
            ..ReadinessConfig::default()
        };
        let host = SceneHost::new(scene, &config);

        time::sleep(Duration::from_millis(5)).await;
        host.next_frame().await;
        assert_eq!(host.epoch.elapsed(), Duration::from_millis(20));
        host.next_frame().await;
        assert_eq!(host.epoch.elapsed(), Duration::from_millis(40));

        // Scene without text has nothing to load.
        assert!(host.fonts_ready().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_frame_clock_still_reaches_two_boundaries() {
        let config = ReadinessConfig {
            font_settle_ms: 0,
            animation_settle_ms: 0,
            frame_interval_ms: 1000,
            ..ReadinessConfig::default()
        };
        let timings = ReadinessTimings::from(&config);
        assert_eq!(timings.frame_wait, Duration::from_millis(2000));

        let host = SceneHost::new(empty_scene(), &config);
        ReadinessGate::new(&host, timings).await_readiness().await;

        // Timed-out waits would have returned after 2 x 250 ms.
        assert_eq!(host.epoch.elapsed(), Duration::from_millis(2000));
    }

    #[test]
    fn fast_frame_clock_keeps_minimum_wait() {
        let timings = ReadinessTimings::from(&ReadinessConfig::default());
        assert_eq!(timings.frame_wait, MIN_FRAME_WAIT);
    }
}
