//! # Bus fan-out demo
//!
//! Demonstrates basic servisor features:
//! - Deploying a component group with lifecycle hooks
//! - Scaling a bus subscriber with `deploy_from_producer`
//! - In-memory topics: every subscription sees every message
//! - Graceful shutdown on Ctrl+C

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use servisor::{
    BoxError, ComponentFn, ComponentRef, Message, Options, ProduceOption, Subscriber, Supervisor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("🚀 Fan-out demo: one publisher, three workers on one topic");
    println!("   Press Ctrl+C to stop\n");

    let supervisor = Supervisor::new(Options::new("fanout-demo", env!("CARGO_PKG_VERSION")));
    let handle = supervisor.handle();

    supervisor.hooks().on_start(|_ctx| async {
        println!("🔧 warming up");
        Ok::<_, BoxError>(())
    });
    supervisor.hooks().on_stop(|_ctx| async {
        println!("🔧 all flushed, goodbye");
        Ok::<_, BoxError>(())
    });

    // Three workers sharing one handler; each subscription gets every message.
    supervisor
        .deploy_from_producer(
            Subscriber::producer("worker", "ticks", |message: Message| async move {
                println!("📨 got {}", String::from_utf8_lossy(&message.body));
                Ok::<_, BoxError>(())
            }),
            ProduceOption::new(3),
        )
        .await?;

    // The publisher reaches the same topic through the shared handle.
    let publisher: ComponentRef = ComponentFn::arc("publisher", move |ctx: CancellationToken| {
        let handle = handle.clone();
        async move {
            let topic = handle.event_bus().topic("ticks").await?;
            let mut n = 0u64;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        n += 1;
                        topic.publish(Message::new(format!("tick-{n}"))).await?;
                        println!("📤 sent tick-{n}");
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
