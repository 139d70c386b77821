//! # External provider.
//!
//! Talks to a remote broker over TCP using length-prefixed JSON frames
//! (see [`wire`]). Every topic handle and every subscription owns its own
//! connection; a publish is a `publish` request followed by one `ok` or
//! `error` response, a subscription is a single `subscribe` request followed
//! by a stream of `deliver` frames.
//!
//! ## Rules
//! - Brokers are tried in the order configured; the first reachable one wins.
//! - A subscription is acknowledged before any delivery arrives, so a
//!   successful open means the broker has registered the consumer group.
//! - A transport error during publish leaves the stream mid-frame, so the
//!   connection is dropped and later publishes return [`BusError::Closed`].

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::warn;

use crate::bus::wire::{self, Request, Response};
use crate::bus::Message;
use crate::error::BusError;

/// Per-broker connect budget.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects to the first reachable broker.
async fn dial(brokers: &[String]) -> Result<TcpStream, BusError> {
    let mut last_error = String::from("no broker addresses");
    for addr in brokers {
        match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => {
                warn!(broker = %addr, error = %e, "broker connect failed");
                last_error = format!("{addr}: {e}");
            }
            Err(_) => {
                warn!(broker = %addr, "broker connect timed out");
                last_error = format!("{addr}: connect timed out");
            }
        }
    }
    Err(BusError::Connect {
        brokers: brokers.to_vec(),
        error: last_error,
    })
}

/// Publish endpoint bound to one remote topic.
#[derive(Debug)]
pub(crate) struct ExternalTopic {
    topic: String,
    conn: Mutex<Option<TcpStream>>,
}

impl ExternalTopic {
    /// Dials a broker and binds the connection to `topic`.
    pub(crate) async fn open(brokers: &[String], topic: String) -> Result<Self, BusError> {
        let stream = dial(brokers).await?;
        Ok(Self {
            topic,
            conn: Mutex::new(Some(stream)),
        })
    }

    /// Publishes one message and waits for the broker's verdict.
    pub(crate) async fn publish(&self, message: Message) -> Result<(), BusError> {
        let mut conn = self.conn.lock().await;
        let stream = conn.as_mut().ok_or(BusError::Closed)?;
        let request = Request::Publish {
            topic: self.topic.clone(),
            message,
        };
        let response = match exchange(stream, &request).await {
            Ok(response) => response,
            Err(error) => {
                // the stream may be mid-frame now; drop it
                conn.take();
                return Err(error);
            }
        };
        match response {
            Response::Ok => Ok(()),
            Response::Error { reason } => Err(BusError::Rejected { reason }),
            Response::Deliver { .. } => Err(BusError::Unexpected { frame: "deliver" }),
        }
    }

    /// Closes the broker connection; later publishes return [`BusError::Closed`].
    pub(crate) async fn shutdown(&self) -> Result<(), BusError> {
        let mut conn = self.conn.lock().await;
        if let Some(mut stream) = conn.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

async fn exchange(stream: &mut TcpStream, request: &Request) -> Result<Response, BusError> {
    wire::send(stream, request).await?;
    wire::recv(stream).await
}

/// Delivery stream bound to one remote topic and consumer group.
#[derive(Debug)]
pub(crate) struct ExternalSubscription {
    stream: TcpStream,
}

impl ExternalSubscription {
    /// Dials a broker, registers the consumer group, and waits for the ack.
    pub(crate) async fn open(
        brokers: &[String],
        topic: String,
        group: String,
    ) -> Result<Self, BusError> {
        let mut stream = dial(brokers).await?;
        wire::send(&mut stream, &Request::Subscribe { topic, group }).await?;
        match wire::recv(&mut stream).await? {
            Response::Ok => Ok(Self { stream }),
            Response::Error { reason } => Err(BusError::Rejected { reason }),
            Response::Deliver { .. } => Err(BusError::Unexpected { frame: "deliver" }),
        }
    }

    /// Waits for the next delivered message.
    ///
    /// Returns [`BusError::Closed`] once the broker hangs up.
    pub(crate) async fn receive(&mut self) -> Result<Message, BusError> {
        let response = match wire::recv(&mut self.stream).await {
            Ok(response) => response,
            Err(BusError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(BusError::Closed)
            }
            Err(error) => return Err(error),
        };
        match response {
            Response::Deliver { message } => Ok(message),
            Response::Error { reason } => Err(BusError::Rejected { reason }),
            Response::Ok => Err(BusError::Unexpected { frame: "ok" }),
        }
    }

    pub(crate) async fn shutdown(mut self) -> Result<(), BusError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    use crate::bus::memory::MemoryChannels;

    /// Minimal broker speaking the wire protocol, routing through a
    /// per-topic broadcast table. Rejects publishes to `forbidden`.
    async fn stub_broker() -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub broker");
        let addr = listener.local_addr().expect("stub broker addr").to_string();
        let channels = Arc::new(MemoryChannels::default());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&channels)));
            }
        });
        addr
    }

    async fn serve(mut stream: TcpStream, channels: Arc<MemoryChannels>) -> Result<(), BusError> {
        loop {
            match wire::recv(&mut stream).await? {
                Request::Publish { topic, message } => {
                    if topic == "forbidden" {
                        let response = Response::Error {
                            reason: "publishing to forbidden is not allowed".to_string(),
                        };
                        wire::send(&mut stream, &response).await?;
                    } else {
                        let _ = channels.sender(&topic).send(message);
                        wire::send(&mut stream, &Response::Ok).await?;
                    }
                }
                Request::Subscribe { topic, .. } => {
                    let mut rx = channels.sender(&topic).subscribe();
                    wire::send(&mut stream, &Response::Ok).await?;
                    while let Ok(message) = rx.recv().await {
                        wire::send(&mut stream, &Response::Deliver { message }).await?;
                    }
                    return Ok(());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_publish_is_acknowledged() {
        let broker = stub_broker().await;
        let topic = ExternalTopic::open(&[broker], "jobs".to_string())
            .await
            .expect("open must dial the stub broker");

        topic
            .publish(Message::new("payload"))
            .await
            .expect("broker must ack the publish");
    }

    #[tokio::test]
    async fn test_publish_rejection_carries_reason() {
        let broker = stub_broker().await;
        let topic = ExternalTopic::open(&[broker], "forbidden".to_string())
            .await
            .expect("open must dial the stub broker");

        let err = topic
            .publish(Message::new("payload"))
            .await
            .expect_err("broker must reject the publish");
        assert!(
            matches!(err, BusError::Rejected { ref reason } if reason.contains("forbidden")),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_subscribe_then_receive() {
        let broker = stub_broker().await;
        let mut sub = ExternalSubscription::open(
            &[broker.clone()],
            "jobs".to_string(),
            "workers".to_string(),
        )
        .await
        .expect("subscribe must be acked before deliveries");

        let topic = ExternalTopic::open(&[broker], "jobs".to_string())
            .await
            .expect("open must dial the stub broker");
        topic
            .publish(Message::new("task-1"))
            .await
            .expect("broker must ack the publish");

        let got = sub.receive().await.expect("delivery must arrive");
        assert_eq!(got.body, b"task-1");
    }

    #[tokio::test]
    async fn test_dial_failure_names_brokers() {
        // bind then drop, so the port is allocated but nothing listens
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        drop(listener);

        let err = ExternalTopic::open(&[addr.clone()], "jobs".to_string())
            .await
            .expect_err("dial must fail with no listener");
        assert!(
            matches!(err, BusError::Connect { ref brokers, .. } if brokers == &[addr]),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_is_closed() {
        let broker = stub_broker().await;
        let topic = ExternalTopic::open(&[broker], "jobs".to_string())
            .await
            .expect("open must dial the stub broker");

        topic.shutdown().await.expect("shutdown must succeed");
        let err = topic
            .publish(Message::new("late"))
            .await
            .expect_err("publish after shutdown must fail");
        assert!(matches!(err, BusError::Closed), "unexpected error: {err}");
    }
}
