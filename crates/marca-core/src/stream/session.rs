//! Streaming session: one request/response cycle against the backend.
//!
//! The session drives [`FrameDecoder`] and [`extract`] over the body stream,
//! appends every delta to the accumulated text and publishes the new value
//! through its [`StreamTicket`]. The read loop suspends on each chunk; no
//! other task touches the session state. A superseded ticket ends the read
//! loop at the next suspension point.

use futures_util::future::{Either, select};
use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use marca_types::backend::{BackendError, GenerationRequest};

use crate::backend::TextBackend;

use super::decoder::FrameDecoder;
use super::extract::{Extraction, SkipReason, extract};
use super::feed::StreamTicket;

/// Ephemeral state owned by one in-flight session.
#[derive(Debug, Default)]
pub struct StreamState {
    /// Accumulated assistant text. Append-only.
    text: String,
    decoder: FrameDecoder,
    terminal: bool,
    deltas: usize,
    skipped: usize,
}

impl StreamState {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// Ingests one response body and publishes the running text.
pub struct StreamingSession<'t> {
    state: StreamState,
    ticket: &'t StreamTicket,
}

impl<'t> StreamingSession<'t> {
    pub fn new(ticket: &'t StreamTicket) -> Self {
        Self {
            state: StreamState::default(),
            ticket,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Process one body chunk. Returns the number of deltas appended.
    ///
    /// After the session is terminal (end of stream or `[DONE]`) this is a
    /// no-op.
    pub fn accept_chunk(&mut self, chunk: &[u8]) -> usize {
        if self.state.terminal {
            return 0;
        }
        let before = self.state.deltas;
        for line in self.state.decoder.push(chunk) {
            if self.apply_line(&line) {
                self.state.terminal = true;
                break;
            }
        }
        self.state.deltas - before
    }

    /// Handle end of stream: the unterminated remainder is one last line.
    pub fn finish(&mut self) {
        if self.state.terminal {
            return;
        }
        if let Some(rest) = self.state.decoder.finish() {
            self.apply_line(&rest);
        }
        self.state.terminal = true;
    }

    /// Drain `body` to completion and return the final accumulated text.
    ///
    /// An empty body yields an empty string. A chunk error aborts the session
    /// and nothing accumulated so far is returned. If the ticket is
    /// superseded while waiting for a chunk, reading stops and the partial
    /// text is returned; callers check [`StreamTicket::is_current`] before
    /// using it.
    pub async fn ingest<S, B>(mut self, body: S) -> Result<String, BackendError>
    where
        S: Stream<Item = Result<B, BackendError>>,
        B: AsRef<[u8]>,
    {
        let mut body = std::pin::pin!(body);
        let ticket = self.ticket;
        let mut superseded = std::pin::pin!(ticket.superseded());
        while !self.state.terminal {
            let next = match select(body.next(), superseded.as_mut()).await {
                Either::Left((next, _)) => next,
                Either::Right(((), _)) => {
                    debug!(
                        generation = ticket.generation(),
                        chars = self.state.text.chars().count(),
                        "stream superseded, reading stopped"
                    );
                    return Ok(self.state.text);
                }
            };
            match next {
                Some(Ok(chunk)) => {
                    self.accept_chunk(chunk.as_ref());
                }
                Some(Err(err)) => return Err(err),
                None => self.finish(),
            }
        }
        debug!(
            generation = self.ticket.generation(),
            deltas = self.state.deltas,
            skipped = self.state.skipped,
            chars = self.state.text.chars().count(),
            "stream settled"
        );
        Ok(self.state.text)
    }

    /// Apply one logical line. Returns true when the stream is done.
    fn apply_line(&mut self, line: &str) -> bool {
        match extract(line) {
            Extraction::Delta(delta) => {
                if !delta.is_empty() {
                    self.state.text.push_str(&delta);
                    self.state.deltas += 1;
                    self.ticket.publish(&self.state.text);
                }
                false
            }
            Extraction::Done => {
                trace!("done sentinel received");
                true
            }
            Extraction::Skip(SkipReason::Blank) => false,
            Extraction::Skip(SkipReason::MalformedFrame) => {
                self.state.skipped += 1;
                trace!(line = %line, "skipping malformed frame");
                false
            }
        }
    }
}

/// Send `request` and ingest the reply, publishing through `ticket`.
#[tracing::instrument(
    name = "stream_reply",
    skip(backend, request, ticket),
    fields(conversation_id = %request.conversation_id, generation = ticket.generation())
)]
pub async fn stream_reply<B: TextBackend>(
    backend: &B,
    request: &GenerationRequest,
    ticket: &StreamTicket,
) -> Result<String, BackendError> {
    let body = backend.send(request).await?;
    StreamingSession::new(ticket).ingest(body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::feed::StreamFeed;
    use futures_util::stream;

    fn chunks(parts: &[&str]) -> Vec<Result<Vec<u8>, BackendError>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    async fn ingest(parts: &[&str]) -> String {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        StreamingSession::new(&ticket)
            .ingest(stream::iter(chunks(parts)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sse_framing() {
        let text = ingest(&[
            "data: {\"content\":\"Hello\"}\n\n",
            "data: {\"content\":\" world\"}\n\ndata: [DONE]\n\n",
        ])
        .await;
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn json_lines_framing() {
        let text = ingest(&["{\"text\":\"Hello\"}\n{\"te", "xt\":\" world\"}\n"]).await;
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn plain_text_framing() {
        let text = ingest(&["Hello\n", " world"]).await;
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn mixed_framings_in_one_body() {
        let text = ingest(&["data: Hel\n{\"message\":\"lo\"}\r\n", " world\n"]).await;
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn done_stops_extraction() {
        let text = ingest(&["data: a\ndata: [DONE]\ndata: b\n", "data: c\n"]).await;
        assert_eq!(text, "a");
    }

    #[tokio::test]
    async fn done_stops_before_remainder() {
        let text = ingest(&["data: a\ndata: [DONE]\ntrailing"]).await;
        assert_eq!(text, "a");
    }

    #[tokio::test]
    async fn empty_body_is_empty_text() {
        assert_eq!(ingest(&[]).await, "");
        assert_eq!(ingest(&["", "\n\n"]).await, "");
    }

    #[tokio::test]
    async fn malformed_lines_do_not_abort() {
        let text = ingest(&["{broken\n{\"unrelated\":1}\nok\n"]).await;
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn publishes_accumulated_text() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let mut session = StreamingSession::new(&ticket);

        assert_eq!(session.accept_chunk(b"data: Hel"), 0);
        assert_eq!(session.accept_chunk(b"lo\n"), 1);
        assert_eq!(feed.snapshot().text, "Hello");
        assert_eq!(session.accept_chunk(b"data: !\n"), 1);
        assert_eq!(feed.snapshot().text, "Hello!");
        assert_eq!(session.state().text(), "Hello!");
    }

    #[tokio::test]
    async fn drained_session_ignores_further_input() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let mut session = StreamingSession::new(&ticket);
        session.accept_chunk(b"one\n");
        session.finish();
        assert!(session.state().is_terminal());

        assert_eq!(session.accept_chunk(b"two\n"), 0);
        session.finish();
        assert_eq!(session.state().text(), "one");
    }

    #[tokio::test]
    async fn stream_error_fails_session() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let body = stream::iter(vec![
            Ok(b"partial\n".to_vec()),
            Err(BackendError::Stream("connection reset".to_string())),
        ]);
        let err = StreamingSession::new(&ticket).ingest(body).await.unwrap_err();
        assert!(matches!(err, BackendError::Stream(_)));
    }

    #[tokio::test]
    async fn stale_ticket_stops_publishing() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let mut session = StreamingSession::new(&ticket);
        session.accept_chunk(b"first\n");
        feed.supersede();
        session.accept_chunk(b"second\n");

        assert_eq!(session.state().text(), "firstsecond");
        assert!(feed.snapshot().text.is_empty());
    }

    #[tokio::test]
    async fn supersede_stops_a_stalled_body() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let body = stream::iter(chunks(&["data: partial\n"])).chain(stream::pending());

        let session = StreamingSession::new(&ticket).ingest(body);
        let cancel = async {
            tokio::task::yield_now().await;
            feed.supersede();
        };
        let (text, ()) = tokio::join!(session, cancel);

        assert_eq!(text.unwrap(), "partial");
        assert!(!ticket.is_current());
        assert!(feed.snapshot().text.is_empty());
    }

    #[tokio::test]
    async fn chunking_does_not_change_result() {
        let body = "data: {\"text\":\"¿Qué\"}\r\ndata: {\"text\":\" tal?\"}\r\n";
        let whole = ingest(&[body]).await;
        for split in 1..body.len() {
            if !body.is_char_boundary(split) {
                continue;
            }
            let (a, b) = body.split_at(split);
            assert_eq!(ingest(&[a, b]).await, whole, "split at {split}");
        }
        assert_eq!(whole, "¿Qué tal?");
    }
}
