//! Startup sequence and supervision of the dashboard and API processes
//!
//! One run is strictly ordered:
//!
//! 1. make sure the cache server is running (start it detached if not)
//! 2. run the dependency installer to completion
//! 3. register for shutdown signals
//! 4. launch the dashboard, then the API server, recording both PIDs
//! 5. wait for the dashboard to exit, then for the API server
//!
//! A shutdown signal received at any point after step 3 terminates both
//! recorded PIDs and ends the run.

use std::sync::Arc;

use ds_core::config::{CommandSpec, InstallFailurePolicy, LauncherConfig};
use ds_core::{ExitOutcome, OrchestratorError, ServiceRole};

use crate::lifecycle::Lifecycle;
use crate::runtime::{ProcessRuntime, RunningChild};
use crate::signals::{ShutdownSignal, ShutdownSource};

/// PIDs of the two supervised processes, captured at launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessHandles {
    /// Dashboard PID (None if its launch failed)
    pub ui: Option<u32>,
    /// API server PID (None if its launch failed)
    pub api: Option<u32>,
}

/// Result of the cache-server step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Step disabled in configuration
    Disabled,
    /// A matching process was found; nothing was started
    AlreadyRunning { pids: Vec<u32> },
    /// The server was started detached
    Started { pid: Option<u32> },
    /// Starting the server failed; the run continued
    SpawnFailed { error: String },
}

/// Result of the dependency installation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Step disabled in configuration
    Skipped,
    /// Installer exited successfully
    Succeeded,
    /// Installer exited unsuccessfully and the run continued
    Failed(ExitOutcome),
    /// Installer could not be started and the run continued
    NotStarted(String),
}

/// How one supervised process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceExit {
    /// Process exited
    Exited(ExitOutcome),
    /// Waiting on the process failed
    WaitFailed(String),
    /// Process was never started
    NotStarted(String),
}

impl ServiceExit {
    /// Exit code a shell `wait` would report
    pub fn shell_code(&self) -> i32 {
        match self {
            ServiceExit::Exited(outcome) => outcome.shell_code(),
            ServiceExit::WaitFailed(_) => 1,
            ServiceExit::NotStarted(_) => 127,
        }
    }
}

/// How the supervision phase ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Both processes exited on their own
    Completed { ui: ServiceExit, api: ServiceExit },
    /// A shutdown signal ended the run
    Interrupted { signal: ShutdownSignal },
}

/// Everything that happened during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cache: CacheStatus,
    pub install: InstallOutcome,
    pub handles: ProcessHandles,
    pub outcome: RunOutcome,
}

impl RunSummary {
    /// Process exit code for the orchestrator itself
    ///
    /// A completed run reports the API server's status (the last process
    /// waited on); an interrupted run reports 0.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            RunOutcome::Completed { api, .. } => api.shell_code(),
            RunOutcome::Interrupted { .. } => 0,
        }
    }
}

/// A launched (or failed) supervised process
pub struct TrackedProcess {
    role: ServiceRole,
    child: Result<Box<dyn RunningChild>, String>,
}

impl TrackedProcess {
    /// Which service this is
    pub fn role(&self) -> ServiceRole {
        self.role
    }

    /// PID captured at launch
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().ok().and_then(|child| child.pid())
    }

    /// Wait for the process; a failed launch returns immediately
    pub async fn wait(self) -> ServiceExit {
        let role = self.role;
        match self.child {
            Ok(mut child) => match child.wait().await {
                Ok(outcome) => {
                    tracing::info!("{} exited ({})", role, outcome);
                    ServiceExit::Exited(outcome)
                }
                Err(e) => {
                    tracing::warn!("Failed to wait on {}: {}", role, e);
                    ServiceExit::WaitFailed(e.to_string())
                }
            },
            Err(error) => ServiceExit::NotStarted(error),
        }
    }
}

/// Drives one devstack run
pub struct Orchestrator<R> {
    config: LauncherConfig,
    runtime: Arc<R>,
    lifecycle: Lifecycle,
}

impl<R: ProcessRuntime> Orchestrator<R> {
    /// Create an orchestrator in the `Running` state
    pub fn new(config: LauncherConfig, runtime: Arc<R>) -> Self {
        Self {
            config,
            runtime,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Configuration this orchestrator runs with
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Lifecycle state machine
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Start the cache server unless a process with its name is running
    ///
    /// Never fails the run: probe errors fall through to a start attempt and
    /// start errors are logged and reported.
    pub async fn ensure_cache_server(&self) -> CacheStatus {
        let cache = &self.config.cache;
        if !cache.enabled {
            tracing::debug!("Cache server step disabled");
            return CacheStatus::Disabled;
        }

        match self.runtime.find_running(&cache.process_name).await {
            Ok(pids) if !pids.is_empty() => {
                tracing::info!("{} already running (PIDs {:?})", cache.process_name, pids);
                return CacheStatus::AlreadyRunning { pids };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "Could not probe for {}: {}; starting it anyway",
                    cache.process_name,
                    e
                );
            }
        }

        let command = cache.command();
        tracing::info!("Starting cache server: {}", command);
        match self.runtime.spawn_detached(&command).await {
            Ok(pid) => CacheStatus::Started { pid },
            Err(e) => {
                tracing::warn!("Failed to start cache server: {}", e);
                CacheStatus::SpawnFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run the installer and block until it exits
    ///
    /// Under [`InstallFailurePolicy::Continue`] a failed install is reported
    /// and the run goes on; under [`InstallFailurePolicy::Abort`] it is an error.
    pub async fn install_dependencies(&self) -> Result<InstallOutcome, OrchestratorError> {
        let install = &self.config.install;
        if !install.enabled {
            tracing::debug!("Dependency installation disabled");
            return Ok(InstallOutcome::Skipped);
        }

        let command = install.command();
        let abort = install.on_failure == InstallFailurePolicy::Abort;
        tracing::info!("Installing dependencies: {}", command);

        match self.runtime.run_to_completion(&command).await {
            Ok(outcome) if outcome.success() => Ok(InstallOutcome::Succeeded),
            Ok(outcome) => {
                tracing::warn!("Dependency installation failed ({})", outcome);
                if abort {
                    return Err(OrchestratorError::InstallFailed(outcome));
                }
                Ok(InstallOutcome::Failed(outcome))
            }
            Err(e) => {
                tracing::warn!("Dependency installer did not run: {}", e);
                if abort {
                    return Err(OrchestratorError::InstallerUnavailable(e));
                }
                Ok(InstallOutcome::NotStarted(e.to_string()))
            }
        }
    }

    /// Spawn a supervised process in the background
    ///
    /// A spawn failure is recorded in the returned handle rather than
    /// returned, so the caller always goes on to the next launch.
    pub async fn launch(&self, role: ServiceRole, command: &CommandSpec) -> TrackedProcess {
        tracing::info!("Starting {}: {}", role, command);
        let child = match self.runtime.spawn(command).await {
            Ok(child) => {
                tracing::debug!("{} started (PID {:?})", role, child.pid());
                Ok(child)
            }
            Err(e) => {
                tracing::error!("Failed to start {}: {}", role, e);
                Err(e.to_string())
            }
        };
        TrackedProcess { role, child }
    }

    /// Wait for the dashboard, then for the API server
    pub async fn wait_for_completion(
        &self,
        ui: TrackedProcess,
        api: TrackedProcess,
    ) -> (ServiceExit, ServiceExit) {
        let ui_exit = ui.wait().await;
        let api_exit = api.wait().await;
        (ui_exit, api_exit)
    }

    /// Terminate both recorded PIDs and exit
    ///
    /// Best effort: no liveness check is made and delivery failures are
    /// only logged.
    pub fn shutdown(&self, signal: ShutdownSignal, handles: &ProcessHandles) {
        if !self.lifecycle.begin_shutdown() {
            return;
        }
        tracing::info!("Shutting down on {}", signal);

        for (role, pid) in [(ServiceRole::Ui, handles.ui), (ServiceRole::Api, handles.api)] {
            let Some(pid) = pid else {
                tracing::debug!("No PID recorded for {}", role);
                continue;
            };
            if let Err(e) = self.runtime.terminate(pid) {
                tracing::debug!("Terminating {} (PID {}) failed: {}", role, pid, e);
            }
        }

        self.lifecycle.mark_exited();
    }

    /// Perform the full startup sequence and supervise until exit or signal
    pub async fn run<S: ShutdownSource>(
        &self,
        shutdown: &mut S,
    ) -> Result<RunSummary, OrchestratorError> {
        let result = self.run_inner(shutdown).await;
        if result.is_err() {
            self.lifecycle.mark_exited();
        }
        result
    }

    async fn run_inner<S: ShutdownSource>(
        &self,
        shutdown: &mut S,
    ) -> Result<RunSummary, OrchestratorError> {
        let cache = self.ensure_cache_server().await;
        let install = self.install_dependencies().await?;

        shutdown
            .register()
            .map_err(OrchestratorError::SignalRegistration)?;

        let ui = self.launch(ServiceRole::Ui, &self.config.ui.command()).await;
        let api = self.launch(ServiceRole::Api, &self.config.api.command()).await;
        let handles = ProcessHandles {
            ui: ui.pid(),
            api: api.pid(),
        };

        // A signal that arrived during the launches is already queued and wins here.
        let outcome = tokio::select! {
            biased;
            signal = shutdown.recv() => {
                self.shutdown(signal, &handles);
                RunOutcome::Interrupted { signal }
            }
            (ui, api) = self.wait_for_completion(ui, api) => {
                self.lifecycle.mark_exited();
                RunOutcome::Completed { ui, api }
            }
        };

        Ok(RunSummary {
            cache,
            install,
            handles,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleState;
    use crate::signals::{self, ManualShutdown};

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use ds_core::ProcessError;
    use tokio::sync::oneshot;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Probe(String),
        SpawnDetached(String),
        Install(String),
        Spawn(String),
        WaitStart(String),
        WaitEnd(String),
        Terminate(u32),
        Register,
    }

    type EventLog = Arc<Mutex<Vec<Event>>>;

    /// In-memory process table
    #[derive(Default)]
    struct FakeRuntime {
        events: EventLog,
        /// PIDs returned for the cache-server probe
        cache_pids: Vec<u32>,
        probe_fails: bool,
        install_exit: Option<ExitOutcome>,
        /// Programs that fail to spawn
        missing: Vec<String>,
        /// Program -> (delay, outcome); absent programs run until terminated
        exits: HashMap<String, (Duration, ExitOutcome)>,
        next_pid: AtomicU32,
        pids: Mutex<HashMap<String, u32>>,
        kill_switches: Mutex<HashMap<u32, oneshot::Sender<()>>>,
    }

    impl FakeRuntime {
        fn new() -> Self {
            Self {
                next_pid: AtomicU32::new(1000),
                ..Default::default()
            }
        }

        fn exiting(mut self, program: &str, after: Duration, outcome: ExitOutcome) -> Self {
            self.exits.insert(program.to_string(), (after, outcome));
            self
        }

        fn record(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn pid_of(&self, program: &str) -> u32 {
            self.pids.lock().unwrap()[program]
        }

        fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
            self.events().iter().filter(|e| matches(e)).count()
        }
    }

    #[async_trait]
    impl ProcessRuntime for FakeRuntime {
        async fn find_running(&self, process_name: &str) -> Result<Vec<u32>, ProcessError> {
            self.record(Event::Probe(process_name.to_string()));
            if self.probe_fails {
                return Err(ProcessError::Probe("process table unavailable".into()));
            }
            Ok(self.cache_pids.clone())
        }

        async fn spawn_detached(&self, command: &CommandSpec) -> Result<Option<u32>, ProcessError> {
            self.record(Event::SpawnDetached(command.to_string()));
            Ok(Some(self.next_pid.fetch_add(1, Ordering::SeqCst)))
        }

        async fn run_to_completion(
            &self,
            command: &CommandSpec,
        ) -> Result<ExitOutcome, ProcessError> {
            self.record(Event::Install(command.to_string()));
            if self.missing.contains(&command.program) {
                return Err(ProcessError::Spawn {
                    program: command.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(self.install_exit.unwrap_or(ExitOutcome::code(0)))
        }

        async fn spawn(
            &self,
            command: &CommandSpec,
        ) -> Result<Box<dyn RunningChild>, ProcessError> {
            self.record(Event::Spawn(command.to_string()));
            if self.missing.contains(&command.program) {
                return Err(ProcessError::Spawn {
                    program: command.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }

            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
            let (kill_tx, kill_rx) = oneshot::channel();
            self.kill_switches.lock().unwrap().insert(pid, kill_tx);
            self.pids
                .lock()
                .unwrap()
                .insert(command.program.clone(), pid);

            Ok(Box::new(FakeChild {
                program: command.program.clone(),
                pid,
                exit: self.exits.get(&command.program).copied(),
                killed: kill_rx,
                events: Arc::clone(&self.events),
            }))
        }

        fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
            self.record(Event::Terminate(pid));
            match self.kill_switches.lock().unwrap().remove(&pid) {
                Some(switch) => {
                    let _ = switch.send(());
                    Ok(())
                }
                None => Err(ProcessError::Signal {
                    pid,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
            }
        }
    }

    struct FakeChild {
        program: String,
        pid: u32,
        exit: Option<(Duration, ExitOutcome)>,
        killed: oneshot::Receiver<()>,
        events: EventLog,
    }

    #[async_trait]
    impl RunningChild for FakeChild {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        async fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
            self.events
                .lock()
                .unwrap()
                .push(Event::WaitStart(self.program.clone()));

            let exit = self.exit;
            let switch = &mut self.killed;
            let killed = async move {
                match switch.await {
                    Ok(()) => ExitOutcome::signalled(15),
                    Err(_) => std::future::pending().await,
                }
            };
            let outcome = match exit {
                Some((after, outcome)) => tokio::select! {
                    _ = tokio::time::sleep(after) => outcome,
                    outcome = killed => outcome,
                },
                None => killed.await,
            };

            self.events
                .lock()
                .unwrap()
                .push(Event::WaitEnd(self.program.clone()));
            Ok(outcome)
        }
    }

    /// Manual shutdown source that logs its registration
    struct RecordingShutdown {
        inner: ManualShutdown,
        events: EventLog,
    }

    #[async_trait]
    impl ShutdownSource for RecordingShutdown {
        fn register(&mut self) -> std::io::Result<()> {
            self.events.lock().unwrap().push(Event::Register);
            self.inner.register()
        }

        async fn recv(&mut self) -> ShutdownSignal {
            self.inner.recv().await
        }
    }

    fn quick_exits(runtime: FakeRuntime) -> FakeRuntime {
        runtime
            .exiting("streamlit", Duration::ZERO, ExitOutcome::code(0))
            .exiting("uvicorn", Duration::ZERO, ExitOutcome::code(0))
    }

    fn orchestrator(runtime: &Arc<FakeRuntime>) -> Orchestrator<FakeRuntime> {
        Orchestrator::new(LauncherConfig::default(), Arc::clone(runtime))
    }

    #[tokio::test]
    async fn test_cache_already_running_is_not_started_again() {
        let runtime = Arc::new(FakeRuntime {
            cache_pids: vec![42],
            ..FakeRuntime::new()
        });

        let status = orchestrator(&runtime).ensure_cache_server().await;

        assert_eq!(status, CacheStatus::AlreadyRunning { pids: vec![42] });
        assert_eq!(runtime.events(), vec![Event::Probe("redis-server".into())]);
    }

    #[tokio::test]
    async fn test_cache_started_detached_when_absent() {
        let runtime = Arc::new(FakeRuntime::new());

        let status = orchestrator(&runtime).ensure_cache_server().await;

        assert!(matches!(status, CacheStatus::Started { pid: Some(_) }));
        assert_eq!(
            runtime.events(),
            vec![
                Event::Probe("redis-server".into()),
                Event::SpawnDetached("redis-server --daemonize yes".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cache_probe_failure_falls_through_to_start() {
        let runtime = Arc::new(FakeRuntime {
            probe_fails: true,
            ..FakeRuntime::new()
        });

        let status = orchestrator(&runtime).ensure_cache_server().await;

        assert!(matches!(status, CacheStatus::Started { .. }));
        assert_eq!(runtime.count(|e| matches!(e, Event::SpawnDetached(_))), 1);
    }

    #[tokio::test]
    async fn test_cache_step_disabled() {
        let runtime = Arc::new(FakeRuntime::new());
        let mut config = LauncherConfig::default();
        config.cache.enabled = false;

        let status = Orchestrator::new(config, Arc::clone(&runtime))
            .ensure_cache_server()
            .await;

        assert_eq!(status, CacheStatus::Disabled);
        assert!(runtime.events().is_empty());
    }

    #[tokio::test]
    async fn test_startup_order() {
        let runtime = Arc::new(quick_exits(FakeRuntime::new()));
        let (_handle, inner) = signals::manual();
        let mut shutdown = RecordingShutdown {
            inner,
            events: Arc::clone(&runtime.events),
        };

        let summary = orchestrator(&runtime).run(&mut shutdown).await.unwrap();

        assert_eq!(
            runtime.events(),
            vec![
                Event::Probe("redis-server".into()),
                Event::SpawnDetached("redis-server --daemonize yes".into()),
                Event::Install("pip install -r requirements.txt".into()),
                Event::Register,
                Event::Spawn("streamlit run dashboard.py --server.port 8501".into()),
                Event::Spawn("uvicorn api.main:app --host 0.0.0.0 --port 8000".into()),
                Event::WaitStart("streamlit".into()),
                Event::WaitEnd("streamlit".into()),
                Event::WaitStart("uvicorn".into()),
                Event::WaitEnd("uvicorn".into()),
            ]
        );
        assert_eq!(summary.install, InstallOutcome::Succeeded);
        assert_eq!(summary.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_failed_install_still_launches_both_once() {
        let runtime = Arc::new(FakeRuntime {
            install_exit: Some(ExitOutcome::code(1)),
            ..quick_exits(FakeRuntime::new())
        });
        let (_handle, mut shutdown) = signals::manual();

        let summary = orchestrator(&runtime).run(&mut shutdown).await.unwrap();

        assert_eq!(summary.install, InstallOutcome::Failed(ExitOutcome::code(1)));
        assert_eq!(runtime.count(|e| matches!(e, Event::Spawn(_))), 2);
        assert!(matches!(summary.outcome, RunOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_missing_installer_continues_by_default() {
        let runtime = Arc::new(FakeRuntime {
            missing: vec!["pip".into()],
            ..quick_exits(FakeRuntime::new())
        });
        let (_handle, mut shutdown) = signals::manual();

        let summary = orchestrator(&runtime).run(&mut shutdown).await.unwrap();

        assert!(matches!(summary.install, InstallOutcome::NotStarted(_)));
        assert_eq!(runtime.count(|e| matches!(e, Event::Spawn(_))), 2);
    }

    #[tokio::test]
    async fn test_abort_policy_stops_before_launch() {
        let runtime = Arc::new(FakeRuntime {
            install_exit: Some(ExitOutcome::code(2)),
            ..quick_exits(FakeRuntime::new())
        });
        let mut config = LauncherConfig::default();
        config.install.on_failure = InstallFailurePolicy::Abort;
        let orchestrator = Orchestrator::new(config, Arc::clone(&runtime));
        let (_handle, mut shutdown) = signals::manual();

        let err = orchestrator.run(&mut shutdown).await.unwrap_err();

        assert!(matches!(err, OrchestratorError::InstallFailed(outcome) if outcome == ExitOutcome::code(2)));
        assert_eq!(runtime.count(|e| matches!(e, Event::Spawn(_))), 0);
        assert_eq!(orchestrator.lifecycle().state(), LifecycleState::Exited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_on_ui_before_api_even_when_api_exits_first() {
        let runtime = Arc::new(
            FakeRuntime::new()
                .exiting("streamlit", Duration::from_secs(30), ExitOutcome::code(0))
                .exiting("uvicorn", Duration::ZERO, ExitOutcome::code(3)),
        );
        let (_handle, mut shutdown) = signals::manual();

        let summary = orchestrator(&runtime).run(&mut shutdown).await.unwrap();

        let waits: Vec<Event> = runtime
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::WaitStart(_) | Event::WaitEnd(_)))
            .collect();
        assert_eq!(
            waits,
            vec![
                Event::WaitStart("streamlit".into()),
                Event::WaitEnd("streamlit".into()),
                Event::WaitStart("uvicorn".into()),
                Event::WaitEnd("uvicorn".into()),
            ]
        );
        assert_eq!(
            summary.outcome,
            RunOutcome::Completed {
                ui: ServiceExit::Exited(ExitOutcome::code(0)),
                api: ServiceExit::Exited(ExitOutcome::code(3)),
            }
        );
        assert_eq!(summary.exit_code(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_terminates_both_children() {
        let runtime = Arc::new(FakeRuntime::new());
        let orchestrator = orchestrator(&runtime);
        let (handle, mut shutdown) = signals::manual();

        let (summary, _) = tokio::join!(orchestrator.run(&mut shutdown), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.trigger(ShutdownSignal::Terminate);
        });
        let summary = summary.unwrap();

        let ui_pid = runtime.pid_of("streamlit");
        let api_pid = runtime.pid_of("uvicorn");
        assert_eq!(
            summary.handles,
            ProcessHandles {
                ui: Some(ui_pid),
                api: Some(api_pid),
            }
        );
        assert_eq!(
            summary.outcome,
            RunOutcome::Interrupted {
                signal: ShutdownSignal::Terminate
            }
        );

        let kills: Vec<Event> = runtime
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Terminate(_)))
            .collect();
        assert_eq!(kills, vec![Event::Terminate(ui_pid), Event::Terminate(api_pid)]);
        assert_eq!(orchestrator.lifecycle().state(), LifecycleState::Exited);
        assert_eq!(summary.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_signal_during_launch_is_not_lost() {
        let runtime = Arc::new(FakeRuntime::new());
        let (handle, mut shutdown) = signals::manual();
        handle.trigger(ShutdownSignal::Interrupt);

        let summary = orchestrator(&runtime).run(&mut shutdown).await.unwrap();

        assert_eq!(
            summary.outcome,
            RunOutcome::Interrupted {
                signal: ShutdownSignal::Interrupt
            }
        );
        assert_eq!(runtime.count(|e| matches!(e, Event::Terminate(_))), 2);
    }

    #[tokio::test]
    async fn test_failed_launch_does_not_block_the_other() {
        let runtime = Arc::new(FakeRuntime {
            missing: vec!["streamlit".into()],
            ..FakeRuntime::new().exiting("uvicorn", Duration::ZERO, ExitOutcome::code(0))
        });
        let (_handle, mut shutdown) = signals::manual();

        let summary = orchestrator(&runtime).run(&mut shutdown).await.unwrap();

        assert_eq!(runtime.count(|e| matches!(e, Event::Spawn(_))), 2);
        assert_eq!(summary.handles.ui, None);
        assert!(summary.handles.api.is_some());
        match summary.outcome {
            RunOutcome::Completed { ui, api } => {
                assert!(matches!(ui, ServiceExit::NotStarted(_)));
                assert_eq!(ui.shell_code(), 127);
                assert_eq!(api, ServiceExit::Exited(ExitOutcome::code(0)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_skips_missing_pid_and_tolerates_dead_children() {
        let runtime = Arc::new(FakeRuntime::new());
        let orchestrator = orchestrator(&runtime);

        orchestrator.shutdown(
            ShutdownSignal::Terminate,
            &ProcessHandles {
                ui: None,
                api: Some(77),
            },
        );

        // PID 77 is unknown to the fake: the error is swallowed
        assert_eq!(runtime.events(), vec![Event::Terminate(77)]);
        assert_eq!(orchestrator.lifecycle().state(), LifecycleState::Exited);

        // Already exited: a second request does nothing
        orchestrator.shutdown(ShutdownSignal::Terminate, &ProcessHandles::default());
        assert_eq!(runtime.events().len(), 1);
    }
}
