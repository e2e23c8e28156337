//! Minimal IRC implementation of [`GenericChatClient`].
//!
//! Only what the bot needs is spoken: registration, `PING`/`PONG`, `JOIN` and
//! `PRIVMSG`. Incoming `001`, `JOIN`, `PART`, `QUIT` and `PRIVMSG` lines are turned
//! into [`ChatEvent`]s. All outbound lines go through one queue drained by a single
//! writer task, so concurrent senders never interleave partial lines.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc},
};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::base::{
    config::Config,
    types::{ChatEvent, IncomingMessage, Res, Void},
};

use super::{ChatClient, GenericChatClient};

/// Longest line accepted from the server.
const MAX_LINE_LENGTH: usize = 8192;

// Extra methods on `ChatClient` applied by the IRC implementation.

impl ChatClient {
    /// Creates a new IRC chat client.
    pub fn irc(config: &Config) -> Self {
        Self::new(Arc::new(IrcChatClient::new(config)))
    }
}

// Structs.

/// IRC client implementation.
pub struct IrcChatClient {
    server: String,
    nick: String,
    user: String,
    outbound: mpsc::UnboundedSender<String>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl IrcChatClient {
    /// Create a new IRC client. Nothing is sent until [`GenericChatClient::start`] runs.
    #[instrument(name = "IrcChatClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        Self {
            server: config.server.clone(),
            nick: config.bot_nick.clone(),
            user: config.bot_user.clone(),
            outbound,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        }
    }

    /// Queue a raw protocol line.
    fn queue(&self, line: String) -> Void {
        self.outbound.send(line).map_err(|_| anyhow::anyhow!("The IRC writer has stopped."))
    }
}

#[async_trait]
impl GenericChatClient for IrcChatClient {
    fn bot_nick(&self) -> &str {
        &self.nick
    }

    #[instrument(skip_all)]
    async fn start(&self, events: mpsc::Sender<ChatEvent>) -> Void {
        let mut outbound_rx = self.outbound_rx.lock().await.take().ok_or(anyhow::anyhow!("The IRC client was already started."))?;

        // Connect and split the framed stream.

        info!("Connecting to {} ...", self.server);

        let stream = TcpStream::connect(&self.server).await?;
        let (mut sink, mut lines) = Framed::new(stream, IrcLineCodec::default()).split();

        // Start the writer.

        let writer = tokio::spawn(
            async move {
                while let Some(line) = outbound_rx.recv().await {
                    debug!(">> {}", line);
                    if let Err(err) = sink.send(line).await {
                        error!("Failed to write to the server: {}", err);
                        break;
                    }
                }
            }
            .in_current_span(),
        );

        // Register.

        self.queue(format!("NICK {}", self.nick))?;
        self.queue(format!("USER {} 0 * :{}", self.user, self.user))?;

        // Read until the connection closes.

        let result = async {
            while let Some(line) = lines.next().await {
                let line = line?;
                debug!("<< {}", line);

                let Some(message) = IrcLine::parse(&line) else {
                    continue;
                };

                if message.command == "PING" {
                    let token = message.params.first().map(String::as_str).unwrap_or_default();
                    self.queue(format!("PONG :{token}"))?;
                    continue;
                }

                if let Some(event) = message.into_event(&self.nick) {
                    if events.send(event).await.is_err() {
                        warn!("Event receiver dropped; stopping the IRC reader.");
                        break;
                    }
                }
            }

            Res::Ok(())
        }
        .await;

        writer.abort();
        warn!("Connection to {} closed.", self.server);

        result
    }

    async fn send_message(&self, target: &str, text: &str) -> Void {
        for line in text.lines().map(|l| l.replace('\r', "")).filter(|l| !l.is_empty()) {
            self.queue(format!("PRIVMSG {target} :{line}"))?;
        }

        Ok(())
    }

    async fn join_channel(&self, channel: &str) -> Void {
        self.queue(format!("JOIN {channel}"))
    }
}

// Framing.

/// Splits the stream on `\n`, decoding each line leniently.
///
/// Bytes that are not UTF-8 are replaced rather than rejected, and lines longer than
/// [`MAX_LINE_LENGTH`] are dropped, so neither ends the connection.
#[derive(Debug, Default)]
pub struct IrcLineCodec {
    discarding: bool,
}

impl Decoder for IrcLineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        loop {
            let Some(end) = buf.iter().position(|b| *b == b'\n') else {
                if buf.len() > MAX_LINE_LENGTH {
                    if !self.discarding {
                        warn!("Dropping a line longer than {} bytes.", MAX_LINE_LENGTH);
                    }
                    self.discarding = true;
                    buf.clear();
                }

                return Ok(None);
            };

            let line = buf.split_to(end + 1);

            // The tail of a line that was already dropped.
            if std::mem::take(&mut self.discarding) {
                continue;
            }

            if end > MAX_LINE_LENGTH {
                warn!("Dropping a line longer than {} bytes.", MAX_LINE_LENGTH);
                continue;
            }

            return Ok(Some(decode_line(&line[..end])));
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }

        if buf.is_empty() || std::mem::take(&mut self.discarding) {
            buf.clear();
            return Ok(None);
        }

        let rest = buf.split();
        Ok(Some(decode_line(&rest)))
    }
}

impl Encoder<String> for IrcLineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");

        Ok(())
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string()
}

// Protocol parsing.

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcLine {
    /// Parse a protocol line, ignoring message tags.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            rest = rest.split_once(' ')?.1;
        }

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ')?;
                rest = tail;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, tail)) => (command, tail),
            None => (rest, ""),
        };

        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        while !rest.is_empty() {
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }

            match rest.split_once(' ') {
                Some((param, tail)) => {
                    if !param.is_empty() {
                        params.push(param.to_string());
                    }
                    rest = tail;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Split the prefix into `(nick, host)`.
    fn source(&self) -> (String, String) {
        let prefix = self.prefix.as_deref().unwrap_or_default();
        let (nick, rest) = prefix.split_once('!').unwrap_or((prefix, ""));
        let host = rest.split_once('@').map(|(_, host)| host).unwrap_or_default();

        (nick.to_string(), host.to_string())
    }

    fn param(&self, index: usize) -> String {
        self.params.get(index).cloned().unwrap_or_default()
    }

    /// Convert into the event the bot cares about, if any.
    pub fn into_event(self, bot_nick: &str) -> Option<ChatEvent> {
        let (nick, host) = self.source();

        let event = match self.command.as_str() {
            "001" => ChatEvent::Connected,
            "JOIN" => ChatEvent::Join { channel: self.param(0), nick },
            "PART" => ChatEvent::Part {
                channel: self.param(0),
                reason: self.param(1),
                nick,
                host,
            },
            "QUIT" => ChatEvent::Quit { reason: self.param(0), nick, host },
            "PRIVMSG" if self.params.len() >= 2 => ChatEvent::Message(IncomingMessage {
                target: self.param(0),
                text: self.param(1),
                is_self_originated: nick == bot_nick,
                sender: nick,
            }),
            _ => return None,
        };

        Some(event)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg() {
        let line = IrcLine::parse(":alice!~al@example.org PRIVMSG #chan :!ddg golang\r\n").unwrap();

        assert_eq!(line.prefix.as_deref(), Some("alice!~al@example.org"));
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.params, vec!["#chan", "!ddg golang"]);
    }

    #[test]
    fn test_parse_ping_and_tags() {
        let ping = IrcLine::parse("PING :irc.example.org").unwrap();
        assert_eq!(ping.command, "PING");
        assert_eq!(ping.params, vec!["irc.example.org"]);

        let tagged = IrcLine::parse("@time=2024-01-01T00:00:00Z :bob!b@h JOIN #chan").unwrap();
        assert_eq!(tagged.command, "JOIN");
        assert_eq!(tagged.params, vec!["#chan"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(IrcLine::parse("").is_none());
        assert!(IrcLine::parse(":prefix-only").is_none());
    }

    #[test]
    fn test_into_event() {
        let connected = IrcLine::parse(":irc.example.org 001 chanbot :Welcome").unwrap();
        assert_eq!(connected.into_event("chanbot"), Some(ChatEvent::Connected));

        let part = IrcLine::parse(":bob!b@host.example PART #chan :see ya").unwrap();
        assert_eq!(
            part.into_event("chanbot"),
            Some(ChatEvent::Part {
                nick: "bob".to_string(),
                host: "host.example".to_string(),
                channel: "#chan".to_string(),
                reason: "see ya".to_string(),
            })
        );

        let quit = IrcLine::parse(":bob!b@host.example QUIT :Ping timeout").unwrap();
        assert_eq!(
            quit.into_event("chanbot"),
            Some(ChatEvent::Quit {
                nick: "bob".to_string(),
                host: "host.example".to_string(),
                reason: "Ping timeout".to_string(),
            })
        );

        let own = IrcLine::parse(":chanbot!c@h PRIVMSG #chan :hello").unwrap();
        let Some(ChatEvent::Message(message)) = own.into_event("chanbot") else {
            panic!("expected a message event");
        };
        assert!(message.is_self_originated);

        let notice = IrcLine::parse(":irc.example.org NOTICE * :Looking up your hostname").unwrap();
        assert_eq!(notice.into_event("chanbot"), None);
    }

    #[tokio::test]
    async fn test_send_message_splits_lines() {
        let config = Config::from(crate::base::config::ConfigInner {
            server: "127.0.0.1:6667".to_string(),
            bot_nick: "chanbot".to_string(),
            ..Default::default()
        });
        let client = IrcChatClient::new(&config);

        client.send_message("#chan", "first\r\n\nsecond\n").await.unwrap();
        client.join_channel("#other").await.unwrap();

        let mut rx = client.outbound_rx.lock().await.take().unwrap();
        assert_eq!(rx.recv().await.unwrap(), "PRIVMSG #chan :first");
        assert_eq!(rx.recv().await.unwrap(), "PRIVMSG #chan :second");
        assert_eq!(rx.recv().await.unwrap(), "JOIN #other");
    }

    #[test]
    fn test_codec_is_lenient() {
        let mut codec = IrcLineCodec::default();
        let mut buf = BytesMut::new();

        buf.put_slice(b"PING :a\r\n:alice!a@h PRIVMSG #chan :caf\xe9\r\nPART");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :a"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some(":alice!a@h PRIVMSG #chan :caf\u{FFFD}"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("PART"));
    }

    #[test]
    fn test_codec_drops_overlong_lines() {
        let mut codec = IrcLineCodec::default();
        let mut buf = BytesMut::new();

        // Arrives in two reads: the first overflows before its newline shows up.
        buf.put_slice(&vec![b'x'; MAX_LINE_LENGTH + 10]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.put_slice(b"tail\r\nPING :b\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :b"));

        // Arrives whole.
        buf.put_slice(&vec![b'y'; MAX_LINE_LENGTH + 1]);
        buf.put_slice(b"\r\nPING :c\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :c"));
    }

    #[tokio::test]
    async fn test_start_against_server() {
        use tokio::{
            io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
            net::TcpListener,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = Config::from(crate::base::config::ConfigInner {
            server: listener.local_addr().unwrap().to_string(),
            bot_nick: "chanbot".to_string(),
            bot_user: "chanbot".to_string(),
            ..Default::default()
        });

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();

            let mut received = vec![lines.next_line().await.unwrap().unwrap(), lines.next_line().await.unwrap().unwrap()];

            write.write_all(b"PING :token\r\n").await.unwrap();
            received.push(lines.next_line().await.unwrap().unwrap());

            write.write_all(b":irc.example.org 001 chanbot :Welcome\r\n").await.unwrap();
            write.write_all(b":alice!a@host PRIVMSG #chan :caf\xe9 latin1\r\n").await.unwrap();
            let mut overlong = b":alice!a@host PRIVMSG #chan :".to_vec();
            overlong.extend(vec![b'x'; MAX_LINE_LENGTH * 2]);
            overlong.extend(b"\r\n");
            write.write_all(&overlong).await.unwrap();
            write.write_all(b":bob!b@host PRIVMSG #chan :hello\r\n").await.unwrap();
            write.shutdown().await.unwrap();

            received
        });

        let client = IrcChatClient::new(&config);
        let (events, mut receiver) = mpsc::channel(16);

        client.start(events).await.unwrap();
        let received = server.await.unwrap();

        assert_eq!(received, vec!["NICK chanbot", "USER chanbot 0 * :chanbot", "PONG :token"]);

        let mut got = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            got.push(event);
        }

        let message = |sender: &str, text: &str| {
            ChatEvent::Message(IncomingMessage {
                text: text.to_string(),
                sender: sender.to_string(),
                target: "#chan".to_string(),
                is_self_originated: false,
            })
        };

        assert_eq!(
            got,
            vec![ChatEvent::Connected, message("alice", "caf\u{FFFD} latin1"), message("bob", "hello")]
        );
    }
}
