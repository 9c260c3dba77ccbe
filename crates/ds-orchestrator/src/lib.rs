//! ds-orchestrator: Starts and supervises the devstack processes
//!
//! The orchestrator makes sure the cache server is up, installs
//! dependencies, then launches the dashboard and the API server side by
//! side and waits for both. A termination signal kills both children.

pub mod lifecycle;
pub mod orchestrator;
pub mod runtime;
pub mod signals;

pub use lifecycle::{Lifecycle, LifecycleState};
pub use orchestrator::{
    CacheStatus, InstallOutcome, Orchestrator, ProcessHandles, RunOutcome, RunSummary,
    ServiceExit, TrackedProcess,
};
pub use runtime::{ProcessRuntime, RunningChild, SystemRuntime};
pub use signals::{manual, ManualShutdown, OsSignals, ShutdownHandle, ShutdownSignal, ShutdownSource};
