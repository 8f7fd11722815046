// External renderer invoked as a child process
use crate::application::renderer::{ChartRenderer, RenderError, RenderRequest};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Runs `program [args..] <category> <mode> <span> <group_id> <index> <output> <merged_log|-> <from> <to>`.
/// `from` and `to` are epoch seconds bounding the plotted window; the span's
/// display label is passed in `GRAPH_SPAN_LABEL`.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl ChartRenderer for CommandRenderer {
    async fn render(&self, request: RenderRequest) -> Result<(), RenderError> {
        let started_at = Instant::now();
        let key = &request.key;
        let to = chrono::Utc::now();
        let from = to - chrono::Duration::seconds(key.span().duration().as_secs() as i64);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(key.scope().tag())
            .arg(key.mode().as_str())
            .arg(key.span().as_str())
            .arg(key.group_id().as_str())
            .arg(key.index().to_string())
            .arg(&request.output);
        match &request.merged_log {
            Some(log) => command.arg(log),
            None => command.arg("-"),
        };
        command
            .arg(from.timestamp().to_string())
            .arg(to.timestamp().to_string())
            .env("GRAPH_SPAN_LABEL", key.span().label())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // The render cache drops this future on timeout; the child goes with it.
            .kill_on_drop(true);

        let output = command.output().await.map_err(|err| {
            tracing::warn!(
                op = "renderer::render",
                result = "error",
                error_code = "spawn",
                program = %self.program.display(),
                error = %err,
                "Failed to spawn chart renderer"
            );
            if err.kind() == ErrorKind::NotFound {
                RenderError::NotFound(err)
            } else {
                RenderError::Io(err)
            }
        })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::warn!(
                op = "renderer::render",
                result = "error",
                error_code = "exit_status",
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                stderr = %stderr,
                "Chart renderer failed"
            );
            return Err(RenderError::Failed { exit_code, stderr });
        }

        if tokio::fs::metadata(&request.output).await.is_err() {
            return Err(RenderError::MissingOutput(request.output.clone()));
        }

        tracing::debug!(
            op = "renderer::render",
            result = "ok",
            key = %key.file_name(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
        );
        Ok(())
    }
}
