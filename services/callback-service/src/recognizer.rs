use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    process::Command,
    time::sleep,
};

use streamhook_common::StopSignal;

use crate::error::RecognizerError;

const DRAIN_CHUNK: usize = 4096;
// How long an unpublish callback is held back after signaling, so the
// recognizer can react before the media server sees the acknowledgement.
const UNPUBLISH_GRACE: Duration = Duration::from_millis(100);

#[async_trait]
pub trait UnpublishNotifier: Send + Sync {
    async fn notify_unpublish(&self);
}

#[derive(Clone)]
pub struct RecognizerConfig {
    pub bin: Option<String>,
    pub dir: Option<String>,
}

impl RecognizerConfig {
    pub fn from_env() -> Self {
        // An empty RECOGNIZER_BIN disables supervision entirely.
        let bin = std::env::var("RECOGNIZER_BIN")
            .ok()
            .filter(|value| !value.is_empty());
        let dir = std::env::var("RECOGNIZER_DIR")
            .ok()
            .filter(|value| !value.is_empty());
        Self { bin, dir }
    }
}

pub struct Recognizer {
    pid: Option<i32>,
}

impl Recognizer {
    pub fn idle() -> Self {
        Self { pid: None }
    }

    pub fn start(config: &RecognizerConfig, stop: StopSignal) -> Result<Self, RecognizerError> {
        let Some(bin) = config.bin.as_deref() else {
            return Ok(Self::idle());
        };

        let mut command = Command::new(bin);
        if let Some(dir) = config.dir.as_deref() {
            command.current_dir(dir);
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| RecognizerError::Spawn {
            bin: bin.to_string(),
            source,
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(RecognizerError::Pipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(RecognizerError::Pipe("stderr"))?;
        let pid = child.id().map(|pid| pid as i32);

        // Both pipes forward to our stdout; losing either one stops the
        // whole service, and the recognizer is never restarted.
        tokio::spawn(pump_output(stdout, tokio::io::stdout(), "stdout", stop.clone()));
        tokio::spawn(pump_output(stderr, tokio::io::stdout(), "stderr", stop.clone()));

        let stop_monitor = stop;
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => tracing::info!(%status, "recognizer exited"),
                    Err(err) => tracing::error!(error = %err, "recognizer wait failed"),
                },
                _ = stop_monitor.wait() => {
                    let _ = child.kill().await;
                }
            }
        });

        tracing::info!(bin, "recognizer started");
        Ok(Self { pid })
    }
}

#[async_trait]
impl UnpublishNotifier for Recognizer {
    async fn notify_unpublish(&self) {
        if let Some(pid) = self.pid {
            send_flush_signal(pid);
            // Fire and forget: the response waits out the grace period
            // whether or not the signal landed.
            sleep(UNPUBLISH_GRACE).await;
        }
    }
}

#[cfg(unix)]
fn send_flush_signal(pid: i32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    if let Err(err) = signal::kill(Pid::from_raw(pid), Signal::SIGUSR1) {
        tracing::warn!(error = %err, pid, "signal recognizer failed");
    }
}

#[cfg(not(unix))]
fn send_flush_signal(pid: i32) {
    tracing::warn!(pid, "recognizer signals are not supported on this platform");
}

async fn pump_output<R, W>(mut from: R, mut to: W, stream: &'static str, stop: StopSignal)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut chunk = [0u8; DRAIN_CHUNK];
    loop {
        match from.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => {
                // Verbatim passthrough, no line reassembly.
                let _ = to.write_all(&chunk[..read]).await;
                let _ = to.flush().await;
            }
            Err(err) => {
                tracing::error!(error = %err, stream, "recognizer output read failed");
                break;
            }
        }
    }
    // A closed pipe means the recognizer is gone; take the service down.
    stop.stop();
}
