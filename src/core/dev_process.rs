use crate::utils::error::{DevReadyError, Result};
use crate::utils::wait::{wait_until, WaitOptions};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

#[cfg(unix)]
use nix::{
    errno::Errno,
    sys::signal::{killpg, Signal},
    unistd::Pid,
};

/// How long a process group gets to exit after SIGTERM before SIGKILL.
pub const TERM_GRACE: Duration = Duration::from_secs(2);

/// Everything a stream has printed so far.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<String>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // A reader that panicked mid-push leaves whole chunks behind, so the text is still usable.
    fn lock(&self) -> MutexGuard<'_, String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, chunk: &str) {
        self.lock().push_str(chunk);
    }

    pub fn snapshot(&self) -> String {
        self.lock().clone()
    }

    pub fn contains_match(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.lock())
    }

    /// Copies `stream` into the buffer until it closes.
    pub fn capture<R>(&self, mut stream: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = self.clone();
        tokio::spawn(async move {
            let mut chunk = [0_u8; 4096];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => buffer.push(&String::from_utf8_lossy(&chunk[..n])),
                    Err(e) => {
                        tracing::debug!("Stopped reading process output: {}", e);
                        break;
                    }
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// A child process whose stdout is collected into a [`LogBuffer`].
///
/// On unix the child leads its own process group, so anything it starts
/// (`npm run` forking node, a shell backgrounding a watcher) is stopped
/// together with it. The group is killed when this value is dropped.
#[derive(Debug)]
pub struct DevProcess {
    name: String,
    child: Child,
    pgid: Option<u32>,
    stdout: LogBuffer,
    reader: Option<JoinHandle<()>>,
}

impl DevProcess {
    pub fn spawn(spec: &ProcessSpec) -> Result<Self> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| DevReadyError::Process {
            name: spec.name.clone(),
            message: format!("could not start '{}': {}", spec.program, e),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| DevReadyError::Process {
            name: spec.name.clone(),
            message: "stdout was not captured".to_string(),
        })?;

        let buffer = LogBuffer::new();
        let reader = buffer.capture(stdout);
        tracing::info!("▶️ Started '{}' ({} {})", spec.name, spec.program, spec.args.join(" "));

        Ok(Self {
            name: spec.name.clone(),
            pgid: child.id(),
            child,
            stdout: buffer,
            reader: Some(reader),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stdout(&self) -> &LogBuffer {
        &self.stdout
    }

    pub async fn wait_for_log(&self, pattern: &Regex, timeout: Duration) -> Result<()> {
        tracing::debug!("Waiting up to {:?} for '{}' to print /{}/", timeout, self.name, pattern);
        wait_until(
            || self.stdout.contains_match(pattern),
            WaitOptions::with_timeout(timeout),
        )
        .await
        .map_err(|_| DevReadyError::Process {
            name: self.name.clone(),
            message: format!(
                "did not print /{}/ within {}ms",
                pattern,
                timeout.as_millis()
            ),
        })
    }

    /// Stops the process and everything it started. SIGTERM goes to the
    /// whole group first so wrappers like npm can shut their children down;
    /// whatever is left after [`TERM_GRACE`] gets SIGKILL.
    pub async fn kill(&mut self) -> Result<()> {
        let was_running = self.child.try_wait()?.is_none();
        self.terminate().await?;
        if was_running {
            tracing::info!("⏹️ Stopped '{}'", self.name);
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        Ok(())
    }

    #[cfg(unix)]
    async fn terminate(&mut self) -> Result<()> {
        if self.pgid.is_none() {
            return Ok(());
        }
        self.signal_group(Signal::SIGTERM);
        if tokio::time::timeout(TERM_GRACE, self.child.wait())
            .await
            .is_err()
        {
            tracing::warn!("'{}' ignored SIGTERM, sending SIGKILL", self.name);
        }
        // background children may outlive the group leader
        self.signal_group(Signal::SIGKILL);
        self.child.wait().await?;
        self.pgid = None;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn terminate(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill().await?;
        }
        self.pgid = None;
        Ok(())
    }

    #[cfg(unix)]
    fn signal_group(&self, signal: Signal) {
        let Some(pgid) = self.pgid else {
            return;
        };
        match killpg(Pid::from_raw(pgid as i32), signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => tracing::debug!("Could not send {:?} to '{}': {}", signal, self.name, e),
        }
    }
}

impl Drop for DevProcess {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.signal_group(Signal::SIGKILL);
    }
}
