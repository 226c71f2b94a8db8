//! Reader session lifecycle: connect to the reader host, spawn the read
//! task feeding the pipeline, stop on demand.

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use tagrelay_core::{DispatchSink, Pipeline, TagReadEvent};

use crate::protocol::parse_report;

/// Default TCP port of the reader's host interface.
pub const DEFAULT_READER_PORT: u16 = 14150;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("cannot connect to reader at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },
}

/// An established connection to the reader hardware, not yet streaming.
#[derive(Debug)]
pub struct ReaderSession {
    stream: TcpStream,
    host: String,
    port: u16,
}

impl ReaderSession {
    /// Connect to the reader's host interface. Failure here is fatal at
    /// startup; the caller decides the exit code.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ReaderError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| ReaderError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        tracing::info!(host, port, "connected to reader");
        Ok(Self {
            stream,
            host: host.to_string(),
            port,
        })
    }

    /// Start the read operation: spawn a task that parses each report
    /// line and feeds the pipeline. Malformed lines are logged and
    /// skipped; they never stop the stream.
    pub fn start_reading<S>(self, pipeline: Arc<Pipeline<S>>) -> ReaderHandle
    where
        S: DispatchSink + 'static,
    {
        let host = self.host;
        let port = self.port;
        let task = tokio::spawn(async move {
            tracing::info!(%host, port, "read operation started");
            let mut lines = BufReader::new(self.stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_report(&line) {
                        Ok((channel, tag)) => {
                            pipeline.handle_event(TagReadEvent::new(channel, tag)).await;
                        }
                        Err(err) => {
                            tracing::warn!(%err, "skipping malformed report line");
                        }
                    },
                    Ok(None) => {
                        tracing::info!("reader closed the report stream");
                        break;
                    }
                    Err(err) => {
                        tracing::error!(%err, "reader stream error, read operation ending");
                        break;
                    }
                }
            }
        });

        ReaderHandle {
            task,
            stopped: false,
        }
    }
}

/// Handle to the running read task.
#[derive(Debug)]
pub struct ReaderHandle {
    task: JoinHandle<()>,
    stopped: bool,
}

impl ReaderHandle {
    /// Halt the read operation and drop the connection. Safe to call
    /// more than once; teardown never propagates an error.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.task.abort();
        tracing::info!("reader session stopped");
    }

    /// Completes when the read task exits (stream end, error, or stop).
    pub async fn wait(&mut self) {
        // A JoinError here is either a cancellation from stop() or a
        // panic already reported by the task; neither propagates.
        let _ = (&mut self.task).await;
    }
}
