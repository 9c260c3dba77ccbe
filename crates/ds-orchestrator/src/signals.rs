//! Shutdown signal sources
//!
//! The orchestrator treats an interrupt or terminate signal as an
//! asynchronous event. [`OsSignals`] delivers the real ones; [`manual`]
//! gives embedders (and tests) a handle to trigger shutdown themselves.

use std::fmt;
use std::io;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Which signal asked the orchestrator to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// A source of shutdown requests
#[async_trait]
pub trait ShutdownSource: Send {
    /// Start listening; requests arriving after this call are never lost
    fn register(&mut self) -> io::Result<()>;

    /// Wait for the next shutdown request
    ///
    /// Pends forever when nothing can ever arrive.
    async fn recv(&mut self) -> ShutdownSignal;
}

/// Interrupt and terminate signals from the operating system
#[derive(Default)]
pub struct OsSignals {
    #[cfg(unix)]
    streams: Option<UnixStreams>,
    #[cfg(not(unix))]
    registered: bool,
}

#[cfg(unix)]
struct UnixStreams {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Create an unregistered source
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShutdownSource for OsSignals {
    #[cfg(unix)]
    fn register(&mut self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        if self.streams.is_none() {
            self.streams = Some(UnixStreams {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            });
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn register(&mut self) -> io::Result<()> {
        self.registered = true;
        Ok(())
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> ShutdownSignal {
        let Some(streams) = self.streams.as_mut() else {
            return std::future::pending().await;
        };

        tokio::select! {
            Some(()) = streams.interrupt.recv() => {
                tracing::info!("Received SIGINT, initiating shutdown...");
                ShutdownSignal::Interrupt
            }
            Some(()) = streams.terminate.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
                ShutdownSignal::Terminate
            }
            else => std::future::pending().await,
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> ShutdownSignal {
        if !self.registered {
            return std::future::pending().await;
        }
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
                ShutdownSignal::Interrupt
            }
            Err(e) => {
                tracing::warn!("Ctrl+C handler failed: {}", e);
                std::future::pending().await
            }
        }
    }
}

/// Create a manually triggered shutdown source and its trigger
pub fn manual() -> (ShutdownHandle, ManualShutdown) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ShutdownHandle { tx }, ManualShutdown { rx })
}

/// Triggers a [`ManualShutdown`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<ShutdownSignal>,
}

impl ShutdownHandle {
    /// Request shutdown; returns false if the orchestrator is gone
    pub fn trigger(&self, signal: ShutdownSignal) -> bool {
        self.tx.send(signal).is_ok()
    }
}

/// Shutdown source fed by a [`ShutdownHandle`]
///
/// Requests sent before [`ShutdownSource::register`] are kept, matching
/// the guarantee of the OS source once registered.
#[derive(Debug)]
pub struct ManualShutdown {
    rx: mpsc::UnboundedReceiver<ShutdownSignal>,
}

#[async_trait]
impl ShutdownSource for ManualShutdown {
    fn register(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn recv(&mut self) -> ShutdownSignal {
        match self.rx.recv().await {
            Some(signal) => signal,
            None => std::future::pending().await,
        }
    }
}
