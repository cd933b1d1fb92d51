// Line-oriented subprocess output.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use crate::error::SourceError;

/// A spawned child whose stdout is read line by line. Dropping the stream
/// kills the child.
pub struct LineStream {
    program: String,
    lines: Lines<BufReader<ChildStdout>>,
    _child: Child,
}

impl LineStream {
    pub fn spawn(argv: &[String]) -> Result<Self, SourceError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SourceError::stream("empty command"))?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::stream(format!("spawn {program}: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::stream(format!("{program}: stdout not captured")))?;
        Ok(Self {
            program: program.clone(),
            lines: BufReader::new(stdout).lines(),
            _child: child,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// `Ok(None)` at end of output.
    pub async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        self.lines
            .next_line()
            .await
            .map_err(|e| SourceError::stream(format!("{}: read: {e}", self.program)))
    }
}

impl std::fmt::Debug for LineStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineStream")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
