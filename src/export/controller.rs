use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::config::Config;
use crate::export::{
    delivery::generate_filename,
    dependencies::ExportDependencies,
    pipeline::run_attempt,
    readiness::{ReadinessGate, ReadinessTimings},
    types::{
        ExportError, ExportEvent, ExportReport, ExportRequest, ExportState, ExportTrigger,
        QualityProfile, Transition, TriggerAck,
    },
};
use crate::notification::Notice;

/// Timing and profile policy of a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub readiness: ReadinessTimings,
    pub primary: QualityProfile,
    pub degraded: QualityProfile,
    /// Wait before the retry, in place of the readiness gate.
    pub retry_delay: Duration,
    /// File name template; see [`generate_filename`].
    pub filename: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ExportSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            readiness: ReadinessTimings::from(&config.readiness),
            primary: QualityProfile::from(&config.export.primary),
            degraded: QualityProfile::from(&config.export.degraded),
            retry_delay: Duration::from_millis(config.export.retry_delay_ms),
            filename: config.output.filename.clone(),
        }
    }
}

/// Orchestrates export attempts for one capture region.
///
/// The controller's state doubles as its busy guard: a trigger is only
/// accepted in [`ExportState::Idle`], and every run ends back in idle after at
/// most one retry. Failures never leave the controller; they end up as
/// transitions, a notification and the returned [`ExportReport`].
pub struct ExportController {
    state: watch::Sender<ExportState>,
    dependencies: ExportDependencies,
    settings: ExportSettings,
}

impl ExportController {
    pub fn new(dependencies: ExportDependencies, settings: ExportSettings) -> Self {
        let (state, _) = watch::channel(ExportState::Idle);
        Self {
            state,
            dependencies,
            settings,
        }
    }

    /// Current state.
    pub fn state(&self) -> ExportState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    /// Handles a trigger: runs the export to completion, or ignores the
    /// trigger when another export is in flight.
    pub async fn export(&self, trigger: ExportTrigger) -> TriggerAck {
        match self.try_begin() {
            Ok(started) => TriggerAck::Completed(self.run(trigger, started).await),
            Err(state) => {
                log::info!(
                    "Ignoring export trigger for '{}': controller is {}",
                    trigger.target_id,
                    state
                );
                TriggerAck::Ignored(state)
            }
        }
    }

    /// Moves Idle → Generating atomically, or reports the state that blocked it.
    pub(crate) fn try_begin(&self) -> Result<Transition, ExportState> {
        let mut outcome = Err(ExportState::Idle);
        self.state.send_if_modified(|state| match state.on(&ExportEvent::Trigger) {
            Some(next) => {
                outcome = Ok(Transition {
                    from: *state,
                    to: next,
                    event: ExportEvent::Trigger,
                });
                *state = next;
                true
            }
            None => {
                outcome = Err(*state);
                false
            }
        });
        outcome
    }

    /// Runs an export whose trigger was accepted by [`Self::try_begin`].
    pub(crate) async fn run(&self, trigger: ExportTrigger, started: Transition) -> ExportReport {
        let mut transitions = vec![started];
        let mut errors = Vec::new();
        let file_name = generate_filename(&self.settings.filename);

        log::info!("Export of '{}' started", trigger.target_id);
        ReadinessGate::new(self.dependencies.host.as_ref(), self.settings.readiness)
            .await_readiness()
            .await;

        let primary = ExportRequest::new(trigger.target_id.clone(), self.settings.primary);
        let mut result = run_attempt(&primary, &self.dependencies, &file_name).await;

        if let Err(err) = result {
            log::warn!("Export attempt failed, retrying with degraded settings: {}", err);
            self.apply(ExportEvent::AttemptFailed(err.kind()), &mut transitions);
            errors.push(err);

            time::sleep(self.settings.retry_delay).await;
            let degraded = ExportRequest::new(trigger.target_id.clone(), self.settings.degraded);
            result = run_attempt(&degraded, &self.dependencies, &file_name).await;
        }

        let (artifact, delivery) = match result {
            Ok(success) => {
                log::info!(
                    "Export of '{}' delivered via {:?}",
                    trigger.target_id,
                    success.delivery.channel
                );
                self.apply(
                    ExportEvent::Delivered(success.delivery.channel),
                    &mut transitions,
                );
                (Some(success.artifact), Some(success.delivery))
            }
            Err(err) => {
                log::error!("Export of '{}' failed: {}", trigger.target_id, err);
                self.apply(ExportEvent::AttemptFailed(err.kind()), &mut transitions);
                errors.push(err);
                (None, None)
            }
        };

        let report = ExportReport {
            target_id: trigger.target_id.clone(),
            final_state: self.state(),
            transitions,
            errors,
            artifact,
            delivery,
        };

        let notice = Notice::for_report(&report, &trigger);
        self.dependencies.notifier.notify(&notice).await;

        let mut report = report;
        self.apply(ExportEvent::Reset, &mut report.transitions);
        report
    }

    fn apply(&self, event: ExportEvent, transitions: &mut Vec<Transition>) {
        self.state.send_if_modified(|state| match state.on(&event) {
            Some(next) => {
                transitions.push(Transition {
                    from: *state,
                    to: next,
                    event,
                });
                *state = next;
                true
            }
            None => {
                log::warn!("Ignoring {:?} in state {}", event, state);
                false
            }
        });
    }
}

/// Fire-and-forget front end for UI code that cannot await an export.
///
/// Trigger acceptance is decided synchronously, so a second trigger that
/// arrives while an export is in flight is rejected immediately.
#[derive(Clone)]
pub struct ExportManager {
    controller: Arc<ExportController>,
    runtime: tokio::runtime::Handle,
    last_report: Arc<std::sync::Mutex<Option<ExportReport>>>,
}

impl ExportManager {
    pub fn new(runtime: &tokio::runtime::Handle, controller: ExportController) -> Self {
        Self {
            controller: Arc::new(controller),
            runtime: runtime.clone(),
            last_report: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Starts an export in the background. Returns `false` if it was ignored.
    pub fn request_export(&self, trigger: ExportTrigger) -> bool {
        let started = match self.controller.try_begin() {
            Ok(started) => started,
            Err(state) => {
                log::info!("Export request ignored while {}", state);
                return false;
            }
        };

        let controller = Arc::clone(&self.controller);
        let last_report = Arc::clone(&self.last_report);
        self.runtime.spawn(async move {
            let report = controller.run(trigger, started).await;
            *last_report
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(report);
        });
        true
    }

    pub fn state(&self) -> ExportState {
        self.controller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.controller.subscribe()
    }

    /// Takes the report of the last finished export, if any.
    pub fn take_report(&self) -> Option<ExportReport> {
        self.last_report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

/// Errors reported by a finished run, first attempt first.
pub fn describe_errors(errors: &[ExportError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
