//! Subprocess backend for command-line stylesheet compilers.

use std::{
    io::Read,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    OutputManifest, StylesheetCompiler,
    error::{CompileError, Result},
};

/// Placeholder in arguments replaced by the project file path.
pub const CONFIG_PLACEHOLDER: &str = "{config}";

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output readers may take to finish after the compiler is killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs an external compiler, e.g. `compass compile`, rooted at the source
/// root. The tool is opaque, so the returned manifest is always empty.
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ExternalCompiler {
    /// Create a compiler running `program compile`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["compile".to_string()],
            timeout: None,
        }
    }

    /// Replace the argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kill the compiler if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn expand_args(&self, project_file: &Path) -> Vec<String> {
        let config = project_file.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(CONFIG_PLACEHOLDER, &config))
            .collect()
    }

    /// Wait for the compiler to exit. On timeout the compiler and every
    /// process it spawned are killed.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let wait_err = |source: std::io::Error| CompileError::Wait {
            program: self.program.clone(),
            source,
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_err);
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(status);
            }
            if start.elapsed() > timeout {
                kill_tree(child, &self.program);
                let _ = child.wait();
                return Err(CompileError::Timeout {
                    program: self.program.clone(),
                    after: timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl StylesheetCompiler for ExternalCompiler {
    fn name(&self) -> &str {
        &self.program
    }

    fn compile(&self, source_root: &Path, project_file: &Path) -> Result<OutputManifest> {
        let args = self.expand_args(project_file);
        info!(
            program = %self.program,
            ?args,
            dir = %source_root.display(),
            "running external stylesheet compiler"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .current_dir(source_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout can kill whatever the tool spawned.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command
            .spawn()
            .map_err(|source| CompileError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes off-thread so a chatty tool cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.wait(&mut child) {
            Ok(status) => status,
            Err(e) => {
                for handle in stdout.into_iter().chain(stderr) {
                    abandon_output(handle, &self.program);
                }
                return Err(e);
            }
        };

        let stdout = stdout.map(join_output).unwrap_or_default();
        let stderr = stderr.map(join_output).unwrap_or_default();

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!(program = %self.program, "{line}");
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!(program = %self.program, "{line}");
        }

        if !status.success() {
            return Err(CompileError::ToolFailed {
                program: self.program.clone(),
                status,
                output: failure_output(&stderr, &stdout),
            });
        }

        debug!(program = %self.program, %status, "external compiler finished");
        Ok(OutputManifest::new())
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_output(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Give a reader of a killed compiler a bounded time to see end of file.
fn abandon_output(handle: JoinHandle<String>, program: &str) {
    let deadline = Instant::now() + DRAIN_GRACE;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(%program, "compiler output still open after kill, detaching reader");
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = handle.join();
}

/// Diagnostics of a failed run. Tools such as Compass report errors on
/// stdout, so both streams are kept.
fn failure_output(stderr: &str, stdout: &str) -> String {
    [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(unix)]
fn kill_tree(child: &mut Child, program: &str) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return kill_child(child, program);
    };
    // SAFETY: signals the process group created for this child at spawn.
    let rc = unsafe { libc::kill(-pid, libc::SIGKILL) };
    if rc != 0 {
        kill_child(child, program);
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child, program: &str) {
    kill_child(child, program);
}

fn kill_child(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        warn!(%program, error = %e, "failed to kill compiler");
    }
}
