use std::{io::ErrorKind, path::PathBuf, time::Duration};

use anyhow::Context;
use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{info, warn};

use chronotherm_common::{
    ActionDispatcher, Mcp23008ButtonPad, Notifier, PassReport, RuntimeConfig,
};

use crate::{
    bus::{HostBus, StdDelay},
    lock::PidLock,
    notify::{LogNotifier, MqttNotifier},
    spool::SpoolMailbox,
    Cli,
};

type ButtonPad = Mcp23008ButtonPad<HostBus, StdDelay>;

/// Everything one polling cycle needs, moved onto a blocking thread for the
/// cycle and handed back afterwards.
struct Controller {
    dispatcher: ActionDispatcher<ButtonPad>,
    mailbox: SpoolMailbox,
    timezone: Option<Tz>,
}

struct ConfigStore {
    path: PathBuf,
}

struct Shutdown {
    interrupt: Signal,
    terminate: Signal,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = ConfigStore::new(cli.config.clone());
    let mut runtime = store.load().await.unwrap_or_else(|err| {
        warn!("failed to load config from {}: {err:#}", store.path.display());
        RuntimeConfig::default()
    });
    apply_env_overrides(&mut runtime);
    apply_cli_overrides(&mut runtime, &cli);
    runtime.sanitize();

    let timezone = parse_timezone(runtime.daemon.timezone.as_deref());
    let dispatcher = build_dispatcher(&runtime)?;
    let mailbox = SpoolMailbox::new(&runtime.daemon.spool_dir);

    info!(
        "chronotherm controller: temps {}..={}, press {:?}/{:?}, spool `{}`, notify={}",
        runtime.thermostat.min_temp,
        runtime.thermostat.max_temp,
        runtime.thermostat.hold(),
        runtime.thermostat.settle(),
        mailbox.dir().display(),
        runtime.daemon.notify,
    );

    let mut controller = Controller {
        dispatcher,
        mailbox,
        timezone,
    };

    // Installed before any pass so SIGINT/SIGTERM never land mid-positioning.
    let mut shutdown = Shutdown::install()?;

    if !cli.command.is_empty() {
        let command = cli.command.join(" ");
        controller.dispatcher.enqueue(command);
        let report = run_one_shot(controller, &mut shutdown).await?;
        log_report(&report);
        return Ok(());
    }

    let lock = PidLock::acquire(&runtime.daemon.lock_file)?;
    info!("holding lock {}", lock.path().display());
    let interval = runtime.daemon.poll_interval();
    info!("polling spool every {}s", interval.as_secs());

    loop {
        let (returned, report) = run_blocking(controller, Controller::cycle).await?;
        controller = returned;
        match report {
            Ok(report) => log_report(&report),
            Err(err) => warn!("dispatch pass aborted: {err:#}"),
        }

        tokio::select! {
            reason = shutdown.recv() => {
                info!("{reason} received, shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    Ok(())
}

impl Controller {
    fn now(&self) -> NaiveDateTime {
        now_in_timezone(self.timezone)
    }

    fn cycle(&mut self) -> anyhow::Result<PassReport> {
        match self.dispatcher.ingest(&mut self.mailbox) {
            Ok(0) => {}
            Ok(queued) => info!("queued {queued} command line(s) from spool"),
            Err(err) => warn!("mailbox check failed: {err:#}"),
        }
        self.dispatch_only()
    }

    fn dispatch_only(&mut self) -> anyhow::Result<PassReport> {
        let now = self.now();
        self.dispatcher
            .run_pass(now)
            .context("button actuation failed")
    }
}

async fn run_one_shot(
    controller: Controller,
    shutdown: &mut Shutdown,
) -> anyhow::Result<PassReport> {
    let (_, report) = run_blocking(controller, Controller::dispatch_only).await?;
    if let Some(reason) = shutdown.pending().await {
        info!("{reason} received during pass, exiting after it");
    }
    report
}

/// Runs one unit of hardware work to completion on the blocking pool. Shutdown
/// is only observed between these units.
async fn run_blocking<T, F>(mut controller: Controller, work: F) -> anyhow::Result<(Controller, T)>
where
    T: Send + 'static,
    F: FnOnce(&mut Controller) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let result = work(&mut controller);
        (controller, result)
    })
    .await
    .context("dispatch task panicked")
}

fn build_dispatcher(runtime: &RuntimeConfig) -> anyhow::Result<ActionDispatcher<ButtonPad>> {
    let bus = HostBus::open(runtime.thermostat.i2c_device.as_deref())?;
    let pad = Mcp23008ButtonPad::new(bus, StdDelay, &runtime.thermostat)
        .context("failed to initialise button pad")?;

    let notifier: Box<dyn Notifier + Send> = if runtime.mqtt.enabled {
        info!(
            "notifications via mqtt `{}:{}` topic `{}`",
            runtime.mqtt.host, runtime.mqtt.port, runtime.mqtt.topic
        );
        Box::new(MqttNotifier::connect(&runtime.mqtt))
    } else {
        Box::new(LogNotifier)
    };

    Ok(ActionDispatcher::new(pad, &runtime.thermostat)
        .with_notifier(notifier, runtime.daemon.notify))
}

fn log_report(report: &PassReport) {
    if report.outcomes.is_empty() && report.deferred == 0 {
        return;
    }
    info!(
        "pass complete: {} executed, {} rejected, {} deferred",
        report.executed(),
        report.rejected(),
        report.deferred
    );
}

impl ConfigStore {
    fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from("./chronotherm.json")),
        }
    }

    async fn load(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => RuntimeConfig::from_json(&raw)
                .with_context(|| format!("invalid config in {}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Shutdown {
    // Handlers are registered up front so a signal that lands mid-pass is
    // still seen once the pass finishes.
    fn install() -> anyhow::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("failed to hook SIGINT")?,
            terminate: signal(SignalKind::terminate()).context("failed to hook SIGTERM")?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    /// A signal that arrived while nobody was waiting, if any.
    async fn pending(&mut self) -> Option<&'static str> {
        tokio::time::timeout(Duration::ZERO, self.recv()).await.ok()
    }
}

fn apply_env_overrides(runtime: &mut RuntimeConfig) {
    if let Ok(host) = std::env::var("MQTT_HOST") {
        runtime.mqtt.host = host;
    }
    if let Some(port) = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        runtime.mqtt.port = port;
    }
    if let Ok(user) = std::env::var("MQTT_USER") {
        runtime.mqtt.user = user;
    }
    if let Ok(pass) = std::env::var("MQTT_PASS") {
        runtime.mqtt.pass = pass;
    }
}

fn apply_cli_overrides(runtime: &mut RuntimeConfig, cli: &Cli) {
    if let Some(timeout) = cli.timeout {
        runtime.daemon.poll_interval_secs = timeout;
    }
    if cli.sendmail {
        runtime.daemon.notify = true;
    }
    if let Some(spool) = &cli.spool {
        runtime.daemon.spool_dir = spool.display().to_string();
    }
}

fn parse_timezone(timezone: Option<&str>) -> Option<Tz> {
    let zone = timezone?;
    match zone.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(err) => {
            warn!("ignoring invalid timezone `{zone}` ({err}); using local time");
            None
        }
    }
}

fn now_in_timezone(timezone: Option<Tz>) -> NaiveDateTime {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
        None => Local::now().naive_local(),
    }
}
