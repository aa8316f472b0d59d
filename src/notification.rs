//! User-facing export notifications, sent via freedesktop D-Bus.

use std::collections::HashMap;

use async_trait::async_trait;
use zbus::{Connection, proxy};

use crate::export::{
    dependencies::Notifier,
    types::{DeliveryChannel, ExportReport, ExportTrigger},
};

/// D-Bus interface for freedesktop Notifications.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Send a notification.
    ///
    /// # Arguments
    /// * `app_name` - Application name
    /// * `replaces_id` - ID of notification to replace (0 for new)
    /// * `app_icon` - Icon name or path
    /// * `summary` - Notification title
    /// * `body` - Notification body text
    /// * `actions` - List of action identifiers and labels
    /// * `hints` - Additional metadata
    /// * `expire_timeout` - Timeout in milliseconds (-1 for default, 0 for never)
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Which outcome a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Saved,
    ShownForManualSave,
    Failed,
}

/// Message shown to the user after an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub summary: String,
    pub body: String,
}

impl Notice {
    /// Builds the notice for a finished run.
    ///
    /// `percentage` and `label` of the trigger only shape this text.
    pub fn for_report(report: &ExportReport, trigger: &ExportTrigger) -> Self {
        let subject = match &trigger.label {
            Some(label) => format!(
                "{} ({:.0}%)",
                label, trigger.quality_context.percentage
            ),
            None => format!("Result ({:.0}%)", trigger.quality_context.percentage),
        };

        match (&report.delivery, report.succeeded()) {
            (Some(delivery), true) if delivery.channel == DeliveryChannel::ShownForManualSave => {
                Notice {
                    kind: NoticeKind::ShownForManualSave,
                    summary: "Image opened in a viewer".to_string(),
                    body: format!(
                        "Saving is not supported here, so {} was opened in a new window.\n\
                         Right-click the image to save it.",
                        subject
                    ),
                }
            }
            (Some(delivery), true) => Notice {
                kind: NoticeKind::Saved,
                summary: "Result image saved".to_string(),
                body: match &delivery.location {
                    Some(path) => format!("{} was saved to {}", subject, path.display()),
                    None => format!("{} was saved", subject),
                },
            },
            _ => {
                let reason = report
                    .errors
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Unknown error".to_string());
                Notice {
                    kind: NoticeKind::Failed,
                    summary: "Image export failed".to_string(),
                    body: format!(
                        "Could not create the image of {}.\n\nError: {}\n\nTry the following:\n\
                         • Reload the result and try again\n\
                         • Use a different viewer or desktop session\n\
                         • Check the panelshot settings",
                        subject, reason
                    ),
                }
            }
        }
    }

    fn icon(&self) -> &'static str {
        match self.kind {
            NoticeKind::Saved => "document-save",
            NoticeKind::ShownForManualSave => "image-x-generic",
            NoticeKind::Failed => "dialog-error",
        }
    }
}

/// Send a system notification.
pub async fn send_notification(summary: &str, body: &str, icon: &str) -> Result<(), String> {
    let connection = Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session bus: {}", e))?;

    let proxy = NotificationsProxy::new(&connection)
        .await
        .map_err(|e| format!("Failed to create notifications proxy: {}", e))?;

    proxy
        .notify(
            "Panelshot",
            0,
            icon,
            summary,
            body,
            vec![],
            HashMap::new(),
            5000,
        )
        .await
        .map_err(|e| format!("Failed to send notification: {}", e))?;

    Ok(())
}

/// Sends notices as desktop notifications.
pub struct DesktopNotifier;

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notice: &Notice) {
        if let Err(e) = send_notification(&notice.summary, &notice.body, notice.icon()).await {
            log::warn!("Failed to send notification: {}", e);
        }
    }
}

/// Writes notices to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Failed => log::error!("{}: {}", notice.summary, notice.body),
            _ => log::info!("{}: {}", notice.summary, notice.body),
        }
    }
}
