use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};

use panelshot::Config;
use panelshot::export::{
    DeliveryChannel, ExportController, ExportDependencies, ExportSettings, ExportTrigger,
    TriggerAck, describe_errors, readiness::ReadinessTimings,
};
use panelshot::scene::{Scene, SceneHandle};

#[derive(Parser, Debug)]
#[command(name = "panelshot")]
#[command(
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PANELSHOT_GIT_HASH"), ")"),
    about = "Export a region of a rendered scene as a PNG image"
)]
struct Cli {
    /// Scene description (JSON) to export from
    #[arg(long, short = 's', value_name = "FILE")]
    scene: PathBuf,

    /// Key of the node to capture
    #[arg(long, short = 't', value_name = "KEY", default_value = "result-panel")]
    target: String,

    /// Label used in notifications
    #[arg(long, value_name = "TEXT")]
    label: Option<String>,

    /// Result percentage used in notifications
    #[arg(long, value_name = "PERCENT", default_value_t = 0.0)]
    percentage: f64,

    /// Directory to save into (overrides the config file)
    #[arg(long, short = 'o', value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Log the outcome instead of sending a desktop notification
    #[arg(long, action = ArgAction::SetTrue)]
    no_notify: bool,

    /// Skip the font and animation settle waits
    #[arg(long, action = ArgAction::SetTrue)]
    no_wait: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = &cli.output_dir {
        config.output.save_directory = dir.to_string_lossy().into_owned();
    }
    if cli.no_notify {
        config.notifications.enabled = false;
    }

    let scene = Scene::load(&cli.scene)
        .with_context(|| format!("Failed to load scene {}", cli.scene.display()))?;
    let scene = SceneHandle::new(scene);

    let mut settings = ExportSettings::from_config(&config);
    if cli.no_wait {
        settings.readiness = ReadinessTimings::immediate();
    }

    let mut trigger = ExportTrigger::new(cli.target).with_percentage(cli.percentage);
    if let Some(label) = cli.label {
        trigger = trigger.with_label(label);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let ack = runtime.block_on(async {
        let controller = ExportController::new(
            ExportDependencies::for_scene(scene, &config),
            settings,
        );
        controller.export(trigger).await
    });

    let report = match ack {
        TriggerAck::Completed(report) => report,
        TriggerAck::Ignored(state) => return Err(anyhow!("Export ignored while {}", state)),
    };

    if !report.succeeded() {
        return Err(anyhow!(
            "Export of '{}' failed: {}",
            report.target_id,
            describe_errors(&report.errors)
        ));
    }

    if let Some(delivery) = &report.delivery {
        let location = delivery
            .location
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        match delivery.channel {
            DeliveryChannel::Saved => println!("Saved {}", location),
            DeliveryChannel::ShownForManualSave => {
                println!("Opened {} for manual saving", location)
            }
        }
    }

    Ok(())
}
