//! # External provider demo
//!
//! Demonstrates the external bus provider against an in-process stand-in
//! broker speaking the framed JSON protocol (4-byte big-endian length prefix,
//! JSON payload):
//! - `EventBus::init` with an external topic entry and a consumer group
//! - Lazy connections: nothing dials until the first topic/subscription use
//! - Graceful shutdown on Ctrl+C
//!
//! The broker here keeps messages as opaque JSON and routes them through a
//! per-topic broadcast channel, which is all the protocol asks of one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use servisor::{
    BoxError, ComponentFn, ComponentRef, ExternalOption, Message, Options, Subscriber, Supervisor,
    TopicOption,
};

type Channels = Arc<Mutex<HashMap<String, broadcast::Sender<Value>>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("🚀 External provider demo: publisher and worker via a TCP broker");
    println!("   Press Ctrl+C to stop\n");

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let broker_addr = listener.local_addr()?.to_string();
    tokio::spawn(run_broker(listener));
    println!("🛰  stub broker listening on {broker_addr}");

    let supervisor = Supervisor::new(Options::new("broker-demo", env!("CARGO_PKG_VERSION")));
    supervisor.event_bus().init([TopicOption::external(
        "orders",
        ExternalOption::new(vec![broker_addr], "orders.v1").with_group("billing"),
    )]);

    let worker = Subscriber::arc("billing", "orders", |message: Message| async move {
        println!("💸 billing got {}", String::from_utf8_lossy(&message.body));
        Ok::<_, BoxError>(())
    });
    supervisor.deploy(vec![worker]).await?;

    let handle = supervisor.handle();
    let publisher: ComponentRef = ComponentFn::arc("orders-feed", move |ctx: CancellationToken| {
        let handle = handle.clone();
        async move {
            let topic = handle.event_bus().topic("orders").await?;
            let mut n = 0u64;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        n += 1;
                        topic.publish(Message::new(format!("order-{n}"))).await?;
                        println!("📤 published order-{n}");
                    }
                }
            }
        }
    });
    supervisor.deploy(vec![publisher]).await?;

    match supervisor.run().await {
        Ok(()) => println!("\n✅ clean exit"),
        Err(e) => println!("\n⚠️  stopped with error: {e}"),
    }
    Ok(())
}

// ---- Stand-in broker ----

async fn run_broker(listener: TcpListener) {
    let channels: Channels = Arc::new(Mutex::new(HashMap::new()));
    while let Ok((stream, _)) = listener.accept().await {
        let channels = Arc::clone(&channels);
        tokio::spawn(async move {
            let _ = serve(stream, channels).await;
        });
    }
}

fn channel(channels: &Channels, topic: &str) -> broadcast::Sender<Value> {
    let mut map = channels.lock().unwrap();
    map.entry(topic.to_string())
        .or_insert_with(|| broadcast::channel(64).0)
        .clone()
}

async fn serve(mut stream: TcpStream, channels: Channels) -> anyhow::Result<()> {
    while let Some(request) = read_frame(&mut stream).await? {
        match request["type"].as_str() {
            Some("publish") => {
                let topic = request["topic"].as_str().unwrap_or_default();
                let _ = channel(&channels, topic).send(request["message"].clone());
                write_frame(&mut stream, &json!({ "type": "ok" })).await?;
            }
            Some("subscribe") => {
                let topic = request["topic"].as_str().unwrap_or_default();
                let mut rx = channel(&channels, topic).subscribe();
                write_frame(&mut stream, &json!({ "type": "ok" })).await?;
                while let Ok(message) = rx.recv().await {
                    write_frame(&mut stream, &json!({ "type": "deliver", "message": message }))
                        .await?;
                }
                return Ok(());
            }
            _ => {
                let reply = json!({ "type": "error", "reason": "unknown request" });
                write_frame(&mut stream, &reply).await?;
            }
        }
    }
    Ok(())
}

async fn read_frame(stream: &mut TcpStream) -> anyhow::Result<Option<Value>> {
    let mut prefix = [0u8; 4];
    match stream.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(prefix) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(Some(serde_json::from_slice(&payload)?))
}

async fn write_frame(stream: &mut TcpStream, value: &Value) -> anyhow::Result<()> {
    let data = serde_json::to_vec(value)?;
    stream.write_all(&(data.len() as u32).to_be_bytes()).await?;
    stream.write_all(&data).await?;
    stream.flush().await?;
    Ok(())
}
