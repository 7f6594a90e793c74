//! Named registry of supervised services.
//!
//! `ProcessManager` owns one [`ManagedProcess`] per service name, launches
//! children in their own process groups, and shuts them down with a
//! SIGTERM → SIGKILL escalation. Entries are never removed: after an exit
//! the last-known state stays queryable until the next `start` recycles it.

use chrono::Utc;
use devdeck_core::{
    EnvironmentPort, ExitError, NoopEnvironment, NoopObserver, ProcessInfo, ProcessState,
    ServiceCatalogPort, ServiceDescriptor, ServiceEvent, SupervisorError, SupervisorObserver,
    SupervisorSettings,
};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::process::{Child, Command};
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::broadcaster::ServiceEventBroadcaster;
use super::done::{DoneSignal, DoneTrigger, done_pair};
use super::health::probe_health;
use super::hub::{LogHub, Unsubscribe};
use super::managed::ManagedProcess;
use super::signals::{SignalBackend, default_signal_backend, exit_error};
use super::stream::spawn_stream_reader;

/// Live output stream plus the handle that ends it.
pub type LogStream = (mpsc::Receiver<String>, Unsubscribe);

struct Inner {
    registry: RwLock<HashMap<String, ManagedProcess>>,
    catalog: Arc<dyn ServiceCatalogPort>,
    environment: Arc<dyn EnvironmentPort>,
    observer: Arc<dyn SupervisorObserver>,
    signals: Arc<dyn SignalBackend>,
    settings: SupervisorSettings,
    events: ServiceEventBroadcaster,
    next_instance: AtomicU64,
}

impl Inner {
    fn publish(&self, entry: &ManagedProcess) {
        let mut event = ServiceEvent::new(&entry.descriptor.name, entry.state).with_pid(entry.pid);
        if let Some(err) = &entry.last_error {
            event = event.with_error(err.clone());
        }
        self.events.broadcast(event);
    }
}

/// Builder wiring a [`ProcessManager`] to its collaborators.
pub struct ProcessManagerBuilder {
    catalog: Arc<dyn ServiceCatalogPort>,
    environment: Arc<dyn EnvironmentPort>,
    observer: Arc<dyn SupervisorObserver>,
    signals: Arc<dyn SignalBackend>,
    settings: SupervisorSettings,
}

impl ProcessManagerBuilder {
    /// Source of extra variables for every child (default: none).
    #[must_use]
    pub fn environment(mut self, environment: Arc<dyn EnvironmentPort>) -> Self {
        self.environment = environment;
        self
    }

    /// Receiver of output lines and exit notifications (default: none).
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn SupervisorObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Override the platform signal backend.
    #[must_use]
    pub fn signal_backend(mut self, signals: Arc<dyn SignalBackend>) -> Self {
        self.signals = signals;
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: SupervisorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> ProcessManager {
        ProcessManager {
            inner: Arc::new(Inner {
                registry: RwLock::new(HashMap::new()),
                catalog: self.catalog,
                environment: self.environment,
                observer: self.observer,
                signals: self.signals,
                settings: self.settings,
                events: ServiceEventBroadcaster::new(),
                next_instance: AtomicU64::new(1),
            }),
        }
    }
}

/// Supervisor for named local services.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct ProcessManager {
    inner: Arc<Inner>,
}

impl ProcessManager {
    /// Start building a manager backed by `catalog`.
    pub fn builder(catalog: Arc<dyn ServiceCatalogPort>) -> ProcessManagerBuilder {
        ProcessManagerBuilder {
            catalog,
            environment: Arc::new(NoopEnvironment),
            observer: Arc::new(NoopObserver),
            signals: default_signal_backend(),
            settings: SupervisorSettings::default(),
        }
    }

    /// Manager with default settings and no environment or observer.
    pub fn new(catalog: Arc<dyn ServiceCatalogPort>) -> Self {
        Self::builder(catalog).build()
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.inner.settings
    }

    /// Launch a service by name.
    ///
    /// Waits for the start grace period before returning so that
    /// processes dying right away are reported as `LaunchFailure` with
    /// their captured output. Surviving the grace period is not a
    /// guarantee of health: a later crash still moves the service to
    /// `Error` in the background.
    pub async fn start(&self, name: &str) -> Result<(), SupervisorError> {
        self.launch(name, false).await.map(drop)
    }

    /// Launch a service with a log subscription taken before the spawn.
    ///
    /// Unlike `start` followed by `subscribe_logs`, the stream also carries
    /// what the service prints during the start grace period.
    pub async fn start_subscribed(&self, name: &str) -> Result<LogStream, SupervisorError> {
        self.launch(name, true)
            .await
            .map(|stream| stream.unwrap_or_else(LogHub::closed_stream))
    }

    async fn launch(&self, name: &str, subscribe: bool) -> Result<Option<LogStream>, SupervisorError> {
        let descriptor = self
            .inner
            .catalog
            .resolve(name)
            .await?
            .ok_or_else(|| SupervisorError::UnknownService(name.to_string()))?;
        let env = self.load_environment(name);
        let instance = self.inner.next_instance.fetch_add(1, Ordering::Relaxed);
        let mut stream = None;

        {
            let mut registry = self.inner.registry.write().await;
            if registry.get(name).is_some_and(|existing| existing.state.is_active()) {
                return Err(SupervisorError::AlreadyRunning(name.to_string()));
            }

            let settings = &self.inner.settings;
            let hub = Arc::new(LogHub::new(
                name,
                settings.output_buffer_lines,
                settings.subscriber_capacity,
                self.inner.observer.clone(),
            ));
            // Before the readers exist, so no early line is missed
            if subscribe {
                stream = Some(hub.subscribe());
            }
            let (trigger, done) = done_pair();
            let mut entry = ManagedProcess::new(instance, descriptor.clone(), hub.clone(), done);

            let mut command = build_command(&descriptor, &env);
            self.inner.signals.setup_group(&mut command);

            match command.spawn() {
                Ok(mut child) => {
                    entry.pid = child.id();
                    entry.started_at = Some(Utc::now());

                    let mut readers = Vec::with_capacity(2);
                    if let Some(stdout) = child.stdout.take() {
                        readers.push(spawn_stream_reader(
                            stdout,
                            name.to_string(),
                            "stdout",
                            hub.clone(),
                        ));
                    }
                    if let Some(stderr) = child.stderr.take() {
                        readers.push(spawn_stream_reader(
                            stderr,
                            name.to_string(),
                            "stderr",
                            hub.clone(),
                        ));
                    }

                    info!(service = %name, pid = ?entry.pid, program = %descriptor.program.display(), "Started service");
                    self.inner.publish(&entry);
                    registry.insert(name.to_string(), entry);

                    tokio::spawn(supervise(
                        self.inner.clone(),
                        name.to_string(),
                        instance,
                        child,
                        readers,
                        trigger,
                        hub,
                    ));
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(service = %name, error = %reason, "Failed to spawn service");

                    entry.state = ProcessState::Error;
                    entry.last_error = Some(ExitError::Spawn(reason.clone()).to_string());
                    hub.seal(&exit_sentinel(name, Some(&reason)));
                    trigger.fire();
                    self.inner.publish(&entry);
                    registry.insert(name.to_string(), entry);

                    return Err(SupervisorError::LaunchFailure {
                        name: name.to_string(),
                        reason,
                        output: Vec::new(),
                    });
                }
            }
        }

        sleep(self.inner.settings.start_grace()).await;

        let mut registry = self.inner.registry.write().await;
        let Some(entry) = registry
            .get_mut(name)
            .filter(|entry| entry.instance == instance)
        else {
            return Ok(stream);
        };

        match entry.state {
            ProcessState::Starting => {
                entry.state = ProcessState::Running;
                debug!(service = %name, "Service survived start grace period");
                self.inner.publish(entry);
                Ok(stream)
            }
            ProcessState::Error => Err(SupervisorError::LaunchFailure {
                name: name.to_string(),
                reason: entry
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "exited during startup".to_string()),
                output: entry.hub.snapshot(),
            }),
            // Exited cleanly or a stop arrived during the grace period
            _ => Ok(stream),
        }
    }

    /// Stop a service and wait until its process has been reaped.
    ///
    /// A no-op for unknown or already stopped services. Escalates to a
    /// forceful kill of the whole process group when the graceful
    /// shutdown does not finish within the stop timeout.
    pub async fn stop(&self, name: &str) -> Result<(), SupervisorError> {
        let settings = &self.inner.settings;
        let (pid, mut done) = {
            let mut registry = self.inner.registry.write().await;
            let Some(entry) = registry.get_mut(name) else {
                return Ok(());
            };

            if entry.state.is_terminal() {
                return Ok(());
            }
            if entry.state == ProcessState::Stopping {
                // Another caller is already driving the shutdown
                (None, entry.done.clone())
            } else {
                entry.state = ProcessState::Stopping;
                self.inner.publish(entry);
                (entry.pid, entry.done.clone())
            }
        };

        let Some(pid) = pid else {
            let bound = settings.stop_timeout() + settings.kill_wait();
            if timeout(bound, done.wait()).await.is_err() {
                warn!(service = %name, "Timed out waiting for concurrent stop");
            }
            return Ok(());
        };

        info!(service = %name, pid = %pid, "Stopping service");
        if let Err(e) = self.inner.signals.terminate(pid) {
            warn!(service = %name, pid = %pid, error = %e, "Failed to send graceful termination");
        }

        if timeout(settings.stop_timeout(), done.wait()).await.is_ok() {
            return Ok(());
        }

        warn!(
            service = %name,
            pid = %pid,
            timeout_secs = settings.stop_timeout_secs,
            "Graceful shutdown timed out, killing process group"
        );
        if let Err(e) = self.inner.signals.force_kill(pid) {
            warn!(service = %name, pid = %pid, error = %e, "Failed to kill process group");
        }

        if timeout(settings.kill_wait(), done.wait()).await.is_err() {
            error!(service = %name, pid = %pid, "Process still alive after forceful kill");
        }
        Ok(())
    }

    /// Stop every starting or running service concurrently.
    ///
    /// Best-effort: individual failures are logged, not returned.
    pub async fn stop_all(&self) -> Result<(), SupervisorError> {
        let names: Vec<String> = {
            let registry = self.inner.registry.read().await;
            registry
                .values()
                .filter(|entry| {
                    matches!(entry.state, ProcessState::Starting | ProcessState::Running)
                })
                .map(|entry| entry.descriptor.name.clone())
                .collect()
        };

        info!(count = names.len(), "Stopping all services");
        for (name, result) in join_all(names.iter().map(|name| async move {
            (name, self.stop(name).await)
        }))
        .await
        {
            if let Err(e) = result {
                warn!(service = %name, error = %e, "Failed to stop service");
            }
        }
        Ok(())
    }

    /// Start every service in `group`.
    ///
    /// Services already running count as success. Failures are collected
    /// into one `GroupPartialFailure`; successful starts are kept.
    pub async fn start_group(&self, group: &str) -> Result<(), SupervisorError> {
        let descriptors = self.group_members(group).await?;
        let results = join_all(descriptors.iter().map(|descriptor| async move {
            (descriptor.name.clone(), self.start(&descriptor.name).await)
        }))
        .await;
        group_result(group, results)
    }

    /// Stop every service in `group`.
    pub async fn stop_group(&self, group: &str) -> Result<(), SupervisorError> {
        let descriptors = self.group_members(group).await?;
        let results = join_all(descriptors.iter().map(|descriptor| async move {
            (descriptor.name.clone(), self.stop(&descriptor.name).await)
        }))
        .await;
        group_result(group, results)
    }

    async fn group_members(&self, group: &str) -> Result<Vec<ServiceDescriptor>, SupervisorError> {
        let descriptors = self.inner.catalog.group(group).await?;
        if descriptors.is_empty() {
            warn!(group = %group, "Group has no services");
        }
        Ok(descriptors)
    }

    /// Current state; `Stopped` for names never started.
    pub async fn status(&self, name: &str) -> ProcessState {
        let registry = self.inner.registry.read().await;
        registry
            .get(name)
            .map_or(ProcessState::Stopped, |entry| entry.state)
    }

    /// OS process id while the process is alive.
    pub async fn pid(&self, name: &str) -> Option<u32> {
        let registry = self.inner.registry.read().await;
        registry.get(name).and_then(|entry| entry.pid)
    }

    /// Error that moved the service to `Error`, if any.
    pub async fn last_error(&self, name: &str) -> Option<String> {
        let registry = self.inner.registry.read().await;
        registry.get(name).and_then(|entry| entry.last_error.clone())
    }

    /// Most recent output lines, oldest first.
    pub async fn last_output(&self, name: &str) -> Vec<String> {
        let registry = self.inner.registry.read().await;
        registry
            .get(name)
            .map(|entry| entry.hub.snapshot())
            .unwrap_or_default()
    }

    /// Snapshot of every known service, sorted by name.
    pub async fn list(&self) -> Vec<ProcessInfo> {
        let registry = self.inner.registry.read().await;
        let mut infos: Vec<ProcessInfo> = registry.values().map(ManagedProcess::info).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Completion signal of the current process instance.
    pub async fn done_signal(&self, name: &str) -> Option<DoneSignal> {
        let registry = self.inner.registry.read().await;
        registry.get(name).map(|entry| entry.done.clone())
    }

    /// Subscribe to live output of a service.
    ///
    /// Unknown or already exited services yield a closed stream, so
    /// callers can subscribe without checking first. When the process
    /// exits the stream receives one `[<name> exited...]` line and closes.
    pub async fn subscribe_logs(&self, name: &str) -> LogStream {
        let registry = self.inner.registry.read().await;
        match registry.get(name) {
            Some(entry) => entry.hub.subscribe(),
            None => LogHub::closed_stream(),
        }
    }

    /// Subscribe to lifecycle transitions of all services.
    pub fn events(&self) -> broadcast::Receiver<ServiceEvent> {
        self.inner.events.subscribe()
    }

    /// One-shot HTTP probe of `127.0.0.1:{port}{path}`.
    pub async fn probe_health(&self, port: u16, path: &str) -> bool {
        probe_health(port, path, self.inner.settings.health_timeout()).await
    }

    /// Probe a service's declared port and health path.
    ///
    /// `Ok(None)` when the service declares no port.
    pub async fn probe_service(&self, name: &str) -> Result<Option<bool>, SupervisorError> {
        let descriptor = self
            .inner
            .catalog
            .resolve(name)
            .await?
            .ok_or_else(|| SupervisorError::UnknownService(name.to_string()))?;

        match descriptor.port {
            Some(port) => Ok(Some(
                self.probe_health(port, descriptor.effective_health_path())
                    .await,
            )),
            None => Ok(None),
        }
    }

    /// Ask whatever listens on `port` to shut down.
    ///
    /// Reconciles services left behind by a previous supervisor instance.
    /// Returns the signalled PIDs; empty when nothing was found or the
    /// platform has no port lookup utility.
    pub async fn kill_process_on_port(&self, port: u16) -> Result<Vec<u32>, SupervisorError> {
        self.inner.signals.kill_by_port(port).await
    }

    fn load_environment(&self, service: &str) -> Vec<(String, String)> {
        match self.inner.environment.load() {
            Ok(vars) => vars,
            Err(e) => {
                warn!(service = %service, error = %e, "Failed to load environment, using inherited variables only");
                Vec::new()
            }
        }
    }
}

fn build_command(descriptor: &ServiceDescriptor, env: &[(String, String)]) -> Command {
    let mut command = Command::new(&descriptor.program);
    command
        .args(&descriptor.args)
        .envs(env.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = &descriptor.working_dir {
        command.current_dir(dir);
    }
    command
}

fn exit_sentinel(name: &str, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("[{name} exited: {reason}]"),
        None => format!("[{name} exited]"),
    }
}

fn group_result(
    group: &str,
    results: Vec<(String, Result<(), SupervisorError>)>,
) -> Result<(), SupervisorError> {
    let failures: Vec<(String, SupervisorError)> = results
        .into_iter()
        .filter_map(|(name, result)| match result {
            Ok(()) | Err(SupervisorError::AlreadyRunning(_)) => None,
            Err(e) => Some((name, e)),
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(SupervisorError::GroupPartialFailure {
            group: group.to_string(),
            failures,
        })
    }
}

/// Waiter task: reaps the child and records how it ended.
async fn supervise(
    inner: Arc<Inner>,
    name: String,
    instance: u64,
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    trigger: DoneTrigger,
    hub: Arc<LogHub>,
) {
    let exit = match child.wait().await {
        Ok(status) => exit_error(status),
        Err(e) => Some(ExitError::Wait(e.to_string())),
    };

    // Let the readers flush what the child wrote before exiting. A
    // grandchild holding the pipe open must not delay the exit report.
    if timeout(inner.settings.drain_timeout(), join_all(readers))
        .await
        .is_err()
    {
        debug!(service = %name, "Output still open after exit, detaching readers");
    }
    let last_lines = hub.snapshot();

    let reported = {
        let mut registry = inner.registry.write().await;
        match registry
            .get_mut(&name)
            .filter(|entry| entry.instance == instance)
        {
            Some(entry) => {
                // A requested stop is a clean exit whatever the signal
                let reported = if entry.state == ProcessState::Stopping {
                    None
                } else {
                    exit
                };
                entry.state = if reported.is_some() {
                    ProcessState::Error
                } else {
                    ProcessState::Stopped
                };
                entry.last_error = reported.as_ref().map(ToString::to_string);
                entry.pid = None;
                inner.publish(entry);
                reported
            }
            None => exit,
        }
    };

    let reason = reported.as_ref().map(ToString::to_string);
    match &reason {
        Some(reason) => warn!(service = %name, error = %reason, "Service exited with error"),
        None => info!(service = %name, "Service exited"),
    }

    hub.seal(&exit_sentinel(&name, reason.as_deref()));
    inner.observer.on_exit(&name, reported.as_ref(), &last_lines);
    // Fire last so a returning `stop` implies observers were notified
    trigger.fire();
}
