//! Running external command line tools under a wall-clock deadline.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::ConvertError;

/// An external program plus arguments placed before the per-call ones,
/// e.g. `java -jar audiveris.jar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    prefix_args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Split a shell-style command line on whitespace: the first word is the
    /// program, the rest become prefix arguments.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program).with_prefix_args(words.map(str::to_string)))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.prefix_args);
        command
    }
}

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run `tool` with `args`, killing it if it has not exited and closed its
/// output pipes within `deadline`.
///
/// On unix the tool leads its own process group, so helpers it forks are
/// killed along with it.
pub async fn run_with_deadline<I, S>(
    tool: &ToolCommand,
    args: I,
    deadline: Duration,
) -> Result<ToolOutput, ConvertError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = tool.display_name();
    let mut command = tool.command();
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    debug!(?command, deadline_secs = deadline.as_secs(), "spawning tool");
    let mut child = command.spawn().map_err(|source| ConvertError::Spawn {
        program: program.clone(),
        source,
    })?;
    // Read before waiting: a reaped child no longer reports its id.
    let group = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let finished = tokio::time::timeout(deadline, async {
        let (status, stdout, stderr) =
            tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr));
        status.map(|status| (status, stdout, stderr))
    })
    .await;

    match finished {
        Ok(result) => {
            let (status, stdout, stderr) = result?;
            Ok(ToolOutput {
                status,
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            })
        }
        Err(_) => {
            warn!(%program, deadline_secs = deadline.as_secs(), "tool exceeded deadline, killing");
            kill_process_group(group);
            if let Err(err) = child.kill().await {
                debug!(%program, error = %err, "tool already exited");
            }
            Err(ConvertError::Timeout {
                program,
                seconds: deadline.as_secs(),
            })
        }
    }
}

#[cfg(unix)]
fn kill_process_group(group: Option<u32>) {
    let Some(pid) = group else {
        return;
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: plain syscall; the group was created for this child alone.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_group: Option<u32>) {}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(err) = pipe.read_to_end(&mut buffer).await {
            debug!(error = %err, "tool pipe closed early");
        }
    }
    buffer
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Where per-request working directories are created.
#[derive(Debug, Clone, Default)]
pub struct ScratchSpace {
    root: Option<PathBuf>,
}

impl ScratchSpace {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// A fresh directory, removed when the returned guard is dropped.
    pub fn create(&self, prefix: &str) -> Result<TempDir, ConvertError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match &self.root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}
