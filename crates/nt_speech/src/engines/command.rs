use std::process::Stdio;

use async_trait::async_trait;
use nt_core::{Error, Result, SpeechEngine};
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::debug;

/// Speaks through an external program such as `espeak-ng`, one process per
/// utterance. The process is killed when the utterance is stopped or dropped.
#[derive(Debug)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    stop_signal: Notify,
}

impl CommandEngine {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("speech.command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            stop_signal: Notify::new(),
        })
    }
}

#[async_trait]
impl SpeechEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Synthesis(format!("failed to start {}: {}", self.program, e)))?;
        debug!(program = %self.program, pid = ?child.id(), "Spawned speech process");

        // dropping `child` on the cancel branch kills the process
        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(Error::Synthesis(format!("{} exited with {}", self.program, status)))
                }
            }
            _ = self.stop_signal.notified() => Err(Error::SpeechCancelled),
        }
    }

    fn stop(&self) {
        self.stop_signal.notify_waiters();
    }
}
