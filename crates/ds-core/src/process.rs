//! Process table queries and signal delivery
//!
//! Probing by name goes through `sysinfo`; liveness checks and termination
//! requests use `kill(2)` directly on unix.

use std::ffi::OsStr;

use sysinfo::{ProcessesToUpdate, System};

use crate::error::ProcessError;

/// PIDs of all processes whose name (or executable file name) is `name`
pub fn find_processes_by_name(name: &str) -> Vec<u32> {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut pids: Vec<u32> = system
        .processes()
        .iter()
        .filter(|(_, process)| {
            process.name() == OsStr::new(name)
                || process
                    .exe()
                    .and_then(|exe| exe.file_name())
                    .is_some_and(|file| file == OsStr::new(name))
        })
        .map(|(pid, _)| pid.as_u32())
        .collect();
    pids.sort_unstable();
    pids
}

/// Check if a process with the given PID is still alive
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // kill(pid, 0) probes without delivering anything; EPERM still means "exists"
    unsafe {
        if libc::kill(raw, 0) == 0 {
            return true;
        }
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_process_alive(pid: u32) -> bool {
    let pid = sysinfo::Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

/// Ask a process to terminate (SIGTERM on unix)
///
/// No liveness check is made first; signalling a process that already
/// exited surfaces as an error the caller may ignore.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<(), ProcessError> {
    let raw = libc::pid_t::try_from(pid).map_err(|_| ProcessError::Signal {
        pid,
        source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
    })?;
    // pid 0 and negative values address process groups, never a single child
    if raw <= 0 {
        return Err(ProcessError::Signal {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        });
    }

    let result = unsafe { libc::kill(raw, libc::SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(ProcessError::Signal {
            pid,
            source: std::io::Error::last_os_error(),
        })
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Result<(), ProcessError> {
    let target = sysinfo::Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    match system.process(target) {
        Some(process) if process.kill() => Ok(()),
        Some(_) => Err(ProcessError::Signal {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }),
        None => Err(ProcessError::Signal {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }),
    }
}
