//! Speaker backed by an external program
//!
//! Each sentence starts a fresh process from the configured command line and
//! is written to its stdin, e.g. `say -r 100` on macOS or `espeak-ng -s 150`
//! on Linux.

use super::speaker::{SpeakOutcome, Speaker};
use crate::cancel::CancelToken;
use crate::{InvDictError, Result};
use log::{debug, error, warn};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Exit status reported when a program can no longer be started mid-session
const SPAWN_FAILED: i32 = 127;

/// How often a speaking child is checked for exit
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// Speaker that runs one external process per sentence
pub struct CommandSpeaker {
    argv: Vec<String>,

    /// Process id of the speaker currently talking, if any
    running: Arc<Mutex<Option<Pid>>>,

    cancel: CancelToken,
}

impl CommandSpeaker {
    /// Verify that the program can be launched and prepare the speaker
    ///
    /// A program that cannot be found or executed is a `Launch` error; it is
    /// reported here, before any sentence is spoken. When `cancel` fires, a
    /// running speaker gets SIGINT.
    pub fn new(argv: Vec<String>, cancel: &CancelToken) -> Result<Self> {
        let program = argv
            .first()
            .ok_or_else(|| InvDictError::Config("speaker command is empty".to_string()))?;

        let path = find_program(program).map_err(|source| InvDictError::Launch {
            program: program.clone(),
            source,
        })?;
        debug!("Speaker {} resolved to {}", program, path.display());

        let running: Arc<Mutex<Option<Pid>>> = Arc::new(Mutex::new(None));
        let hook_running = running.clone();
        cancel.on_cancel(move || {
            if let Some(pid) = *hook_running.lock() {
                debug!("Interrupting speaker pid {}", pid);
                if let Err(e) = kill(pid, Signal::SIGINT) {
                    debug!("Failed to interrupt speaker: {}", e);
                }
            }
        });

        Ok(Self {
            argv,
            running,
            cancel: cancel.clone(),
        })
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Wait for `child` to exit and collect its status
    ///
    /// The pid is reaped and forgotten under the same lock the cancel hook
    /// takes, so the hook never signals a pid that may have been reused.
    fn reap(&self, child: &mut Child) -> io::Result<ExitStatus> {
        loop {
            let mut running = self.running.lock();
            match child.try_wait() {
                Ok(Some(status)) => {
                    *running = None;
                    return Ok(status);
                }
                Ok(None) => {}
                Err(e) => {
                    *running = None;
                    return Err(e);
                }
            }
            drop(running);
            thread::sleep(REAP_INTERVAL);
        }
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, sentence: &str) -> SpeakOutcome {
        debug!("Speaking: {}", sentence);

        let mut child = match Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to start {}: {}", self.argv[0], e);
                return SpeakOutcome::Failed(SPAWN_FAILED);
            }
        };
        let pid = Pid::from_raw(child.id() as i32);
        *self.running.lock() = Some(pid);

        // Cancelled between spawn and registration: the hook has already run
        if self.cancel.is_cancelled() {
            if let Err(e) = kill(pid, Signal::SIGINT) {
                debug!("Failed to interrupt speaker: {}", e);
            }
        }

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(sentence.as_bytes()) {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    warn!("Failed to write sentence to speaker: {}", e);
                }
            }
        }

        match self.reap(&mut child) {
            Ok(status) => {
                let outcome = SpeakOutcome::from_status(status);
                debug!("Speaker finished: {:?}", outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to wait for speaker: {}", e);
                SpeakOutcome::Failed(-1)
            }
        }
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Find an executable the way the shell would
///
/// Names containing a slash are taken as paths; anything else is searched
/// for on `PATH`.
pub fn find_program(program: &str) -> io::Result<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return if !path.exists() {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        } else if is_executable(&path) {
            Ok(path)
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "not an executable file",
            ))
        };
    }

    let search = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "not found on PATH; the speaker command line is probably incorrect",
            )
        })
}
