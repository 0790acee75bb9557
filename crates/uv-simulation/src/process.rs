//! Subprocess simulator
//!
//! Spawns the simulator in its own process group with captured, capped
//! output. Every exit path (normal exit, timeout, dropped future) ends with
//! the whole group killed, so helpers the simulator forked cannot outlive
//! the call.

use crate::client::{SimulationClient, SimulationRequest};
use crate::command::CommandLine;
use crate::error::{CapturedOutput, SimulationError, SimulationResult};
use crate::report::{parse_report, REPORT_FILE_NAME};
use crate::settings::{ReportSource, SimulationSettings};
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uv_effects::Effect;

/// Variables passed through when the parent environment is not inherited
const PASSTHROUGH_ENV: &[&str] = &["PATH", "HOME", "LANG"];

/// How long to wait for output pipes to close once the group is dead
const DRAIN_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8192;

/// Kills a process group when dropped
///
/// Armed from spawn until the group has been killed once.
#[derive(Debug)]
struct ProcessGroupGuard {
    pgid: Option<i32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    #[cfg(unix)]
    fn kill(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pgid) = self.pgid.take() else {
            return;
        };
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) => debug!(pgid, "killed simulator process group"),
            Err(Errno::ESRCH) => {}
            Err(e) => warn!(pgid, error = %e, "failed to kill simulator process group"),
        }
    }

    // Without process groups only the direct child is killed, via kill_on_drop.
    #[cfg(not(unix))]
    fn kill(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if self.pgid.is_some() {
            warn!("simulation cancelled, killing process group");
            self.kill();
        }
    }
}

/// [`SimulationClient`] that runs the simulator as a subprocess
#[derive(Debug, Clone, Default)]
pub struct ProcessSimulator {
    settings: SimulationSettings,
}

impl ProcessSimulator {
    /// Create with settings
    #[must_use]
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    /// Active settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    fn build_command(
        &self,
        command: &CommandLine,
        request: &SimulationRequest,
        report_path: Option<&Path>,
    ) -> Command {
        let mut cmd = Command::new(command.program());
        cmd.args(command.args())
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !self.settings.inherit_env {
            cmd.env_clear();
            for name in PASSTHROUGH_ENV {
                if let Some(value) = std::env::var_os(name) {
                    cmd.env(name, value);
                }
            }
        }

        cmd.env(&self.settings.rpc_url_env, &request.rpc_url);
        if let Some(path) = report_path {
            cmd.env(&self.settings.report_path_env, path);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    async fn read_report_file(
        &self,
        path: &Path,
        stdout: CapturedOutput,
        stderr: CapturedOutput,
    ) -> SimulationResult<String> {
        let cap = self.settings.max_output_bytes as u64;
        let reject = |reason: String,
                      stdout: CapturedOutput,
                      stderr: CapturedOutput|
         -> SimulationResult<String> {
            Err(SimulationError::invalid_report(reason, stdout, stderr))
        };

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > cap => {
                return reject(
                    format!("report file is {} bytes (max: {cap})", meta.len()),
                    stdout,
                    stderr,
                );
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return reject(
                    format!(
                        "simulator did not write a report to ${}",
                        self.settings.report_path_env
                    ),
                    stdout,
                    stderr,
                );
            }
            Err(e) => return Err(SimulationError::Io(e)),
        }

        match tokio::fs::read(path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(text),
                Err(_) => reject("report is not valid UTF-8".to_string(), stdout, stderr),
            },
            Err(e) => Err(SimulationError::Io(e)),
        }
    }
}

#[async_trait]
impl SimulationClient for ProcessSimulator {
    async fn simulate(&self, request: SimulationRequest) -> SimulationResult<Effect> {
        let command = CommandLine::from_tokens(request.command.clone())?
            .substitute(&self.settings.rpc_url_env, &request.rpc_url);

        let report_dir = match self.settings.report {
            ReportSource::File => Some(tempfile::TempDir::new()?),
            ReportSource::Stdout => None,
        };
        let report_path = report_dir
            .as_ref()
            .map(|dir| dir.path().join(REPORT_FILE_NAME));

        let limit = self.settings.timeout();
        info!(
            program = %command.program(),
            args = command.args().len(),
            timeout_secs = limit.as_secs(),
            "spawning simulator"
        );

        let mut child = self
            .build_command(&command, &request, report_path.as_deref())
            .spawn()
            .map_err(|source| SimulationError::Spawn {
                program: command.program().to_string(),
                source,
            })?;
        let mut group = ProcessGroupGuard::new(child.id());
        let started = Instant::now();

        let cap = self.settings.max_output_bytes;
        let stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap));
        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap));

        let status = match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                group.kill();
                stdout_task.abort();
                stderr_task.abort();
                return Err(SimulationError::Io(e));
            }
            Err(_) => {
                warn!(
                    timeout_secs = limit.as_secs(),
                    "simulation timed out, killing process group"
                );
                group.kill();
                if let Err(e) = child.wait().await {
                    warn!(error = %e, "failed to reap simulator");
                }
                stdout_task.abort();
                stderr_task.abort();
                return Err(SimulationError::Timeout { timeout: limit });
            }
        };

        // The leader is gone; sweep anything it left in the group.
        group.kill();

        let stdout = collect(stdout_task, "stdout").await;
        let stderr = collect(stderr_task, "stderr").await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status_text = describe_status(status);

        info!(status = %status_text, elapsed_ms, "simulator exited");

        if !status.success() {
            return Err(SimulationError::Failed {
                status: status_text,
                stdout,
                stderr,
            });
        }

        let text = match report_path {
            Some(path) => self.read_report_file(&path, stdout.clone(), stderr.clone()).await?,
            None if stdout.truncated => {
                return Err(SimulationError::invalid_report(
                    format!("report exceeds output cap of {cap} bytes"),
                    stdout,
                    stderr,
                ));
            }
            None => stdout.text.clone(),
        };

        let effect = parse_report(&text)
            .map_err(|e| SimulationError::invalid_report(e.to_string(), stdout, stderr))?;

        debug!(
            state_changes = effect.state_changes.len(),
            balance_changes = effect.balance_changes.len(),
            "parsed simulation report"
        );

        Ok(effect)
    }
}

/// Read a stream to EOF, keeping at most `cap` bytes
///
/// Keeps draining past the cap so the writer never blocks on a full pipe.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> io::Result<CapturedOutput>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(CapturedOutput::default());
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(kept.len());
        kept.extend_from_slice(&buf[..n.min(room)]);
        if n > room {
            truncated = true;
        }
    }

    Ok(CapturedOutput::new(
        String::from_utf8_lossy(&kept).into_owned(),
        truncated,
    ))
}

async fn collect(
    mut handle: JoinHandle<io::Result<CapturedOutput>>,
    stream: &'static str,
) -> CapturedOutput {
    match timeout(DRAIN_GRACE, &mut handle).await {
        Ok(Ok(Ok(output))) => output,
        Ok(Ok(Err(e))) => {
            warn!(stream, error = %e, "failed to read simulator output");
            CapturedOutput::default()
        }
        Ok(Err(e)) => {
            warn!(stream, error = %e, "simulator output reader panicked");
            CapturedOutput::default()
        }
        Err(_) => {
            handle.abort();
            warn!(stream, "simulator output held open by a detached process");
            CapturedOutput::new(String::new(), true)
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("killed by signal {signal}");
        }
    }
    "terminated abnormally".to_string()
}
