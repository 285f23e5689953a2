//! A single live chat executable and its stdio pipes.

use std::io::{BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::reader::read_until_sentinel;
use super::ChatError;

/// Owns the child process and both ends of its pipes.
///
/// Exactly one prompt can be in flight: [`ChatSession::prompt`] borrows the
/// session mutably and blocks until the response is complete.
pub struct ChatSession {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl ChatSession {
    /// Spawn `executable --model <model_path>` and drain its startup banner.
    pub fn open(executable: &Path, model_path: &Path) -> Result<Self, ChatError> {
        let mut child = Command::new(executable)
            .arg("--model")
            .arg(model_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| ChatError::Spawn {
                path: executable.to_path_buf(),
                source,
            })?;

        tracing::info!(
            pid = child.id(),
            executable = %executable.display(),
            model = %model_path.display(),
            "chat process started"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(BufReader::new);
        let mut session = Self {
            child: Some(child),
            stdin,
            stdout,
        };

        // The banner ends with the same marker as a response.
        let banner = session.read_response(None)?;
        tracing::debug!(bytes = banner.len(), "startup banner drained");

        Ok(session)
    }

    /// Send one prompt and block until the full response has been read.
    pub fn prompt(
        &mut self,
        text: &str,
        echo: Option<&mut dyn Write>,
    ) -> Result<String, ChatError> {
        let stdin = self.stdin.as_mut().ok_or(ChatError::NotConnected)?;
        stdin.write_all(text.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        tracing::debug!(chars = text.chars().count(), "prompt sent");

        self.read_response(echo)
    }

    fn read_response(&mut self, echo: Option<&mut dyn Write>) -> Result<String, ChatError> {
        let stdout = self.stdout.as_mut().ok_or(ChatError::NotConnected)?;
        read_until_sentinel(stdout, echo).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ChatError::SessionEnded
            } else {
                ChatError::Io(e)
            }
        })
    }

    /// Whether a child process is still attached to this session.
    pub fn is_open(&self) -> bool {
        self.child.is_some()
    }

    /// Kill the child process. Safe to call more than once.
    pub fn close(&mut self) {
        self.stdin = None;
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let pid = child.id();
            if let Err(e) = child.kill() {
                tracing::debug!(pid, error = %e, "kill failed, process likely already exited");
            }
            // Reap so the child does not linger as a zombie.
            let _ = child.wait();
            tracing::info!(pid, "chat process terminated");
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}
