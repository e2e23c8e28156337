//! This module handles the per-channel log files.
//!
//! A single task owns all log writes. Commands are queued from the event loop in the
//! order events arrive, so a channel's log lines keep that order, and a channel's log
//! file is created before anything is appended to it.

use std::path::{Path, PathBuf};

use tokio::{
    fs::OpenOptions,
    io::AsyncWriteExt,
    sync::{mpsc, oneshot},
};
use tracing::{Instrument, error, instrument, warn};

use crate::base::types::{LogRecord, Void};

/// A queued logging operation.
enum LogCommand {
    Ensure { channel: String },
    Append { channel: String, record: LogRecord },
    Flush(oneshot::Sender<()>),
}

/// Handle to the logging task.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChannelLogger {
    commands: mpsc::UnboundedSender<LogCommand>,
}

impl ChannelLogger {
    /// Start the logging task writing under `log_dir`.
    #[instrument(skip_all)]
    pub fn spawn(log_dir: PathBuf) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();

        tokio::spawn(run_logger(log_dir, receiver).in_current_span());

        Self { commands }
    }

    /// Make sure the log directory and `channel`'s log file exist.
    pub fn ensure_channel(&self, channel: &str) {
        self.queue(LogCommand::Ensure { channel: channel.to_string() });
    }

    /// Append `record` to `channel`'s log.
    pub fn append(&self, channel: &str, record: LogRecord) {
        self.queue(LogCommand::Append {
            channel: channel.to_string(),
            record,
        });
    }

    /// Wait until everything queued so far has been written.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.queue(LogCommand::Flush(done));
        let _ = wait.await;
    }

    fn queue(&self, command: LogCommand) {
        if self.commands.send(command).is_err() {
            warn!("Channel logger has stopped; dropping a log command.");
        }
    }
}

/// The log file for `channel` under `log_dir`.
pub fn log_path(log_dir: &Path, channel: &str) -> PathBuf {
    log_dir.join(channel.replace(['/', '\\'], "_"))
}

async fn run_logger(log_dir: PathBuf, mut receiver: mpsc::UnboundedReceiver<LogCommand>) {
    while let Some(command) = receiver.recv().await {
        let result = match command {
            LogCommand::Ensure { channel } => ensure_log(&log_dir, &channel).await,
            LogCommand::Append { channel, record } => append_line(&log_dir, &channel, &record).await,
            LogCommand::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
        };

        if let Err(err) = result {
            error!("Error while logging: {}", err);
        }
    }
}

async fn ensure_log(log_dir: &Path, channel: &str) -> Void {
    tokio::fs::create_dir_all(log_dir).await?;
    OpenOptions::new().create(true).append(true).open(log_path(log_dir, channel)).await?;

    Ok(())
}

async fn append_line(log_dir: &Path, channel: &str, record: &LogRecord) -> Void {
    let path = log_path(log_dir, channel);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(|err| anyhow::anyhow!("Failed to open {}: {}", path.display(), err))?;

    file.write_all(format!("{}\n", record.render()).as_bytes()).await?;
    file.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn said(identity: &str, text: &str) -> LogRecord {
        LogRecord::Message {
            identity: identity.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_log_path() {
        assert_eq!(log_path(Path::new("/var/log/bot"), "#sabayon"), PathBuf::from("/var/log/bot/#sabayon"));
        assert_eq!(log_path(Path::new("logs"), "#a/../b"), PathBuf::from("logs/#a_.._b"));
    }

    #[tokio::test]
    async fn test_lines_keep_queue_order() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested/logs");
        let logger = ChannelLogger::spawn(log_dir.clone());

        logger.ensure_channel("#chan");
        logger.append("#chan", LogRecord::System { text: "chanbot has joined".to_string() });
        for i in 0..50 {
            logger.append("#chan", said("alice", &format!("line {i}")));
        }
        logger.flush().await;

        let contents = std::fs::read_to_string(log_path(&log_dir, "#chan")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 51);
        assert_eq!(lines[0], "*** chanbot has joined");
        assert_eq!(lines[1], "alice: line 0");
        assert_eq!(lines[50], "alice: line 49");
    }

    #[tokio::test]
    async fn test_channels_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ChannelLogger::spawn(dir.path().to_path_buf());

        logger.ensure_channel("#one");
        logger.ensure_channel("#two");
        logger.append("#one", said("alice", "in one"));
        logger.append("#two", said("bob", "in two"));
        logger.flush().await;

        assert_eq!(std::fs::read_to_string(dir.path().join("#one")).unwrap(), "alice: in one\n");
        assert_eq!(std::fs::read_to_string(dir.path().join("#two")).unwrap(), "bob: in two\n");
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ChannelLogger::spawn(dir.path().join("never-created"));

        logger.append("#chan", said("alice", "lost"));
        logger.flush().await;

        assert!(!dir.path().join("never-created").exists());
    }
}
