use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use micro_h1::connection::Exchange;
use micro_h1::handler::{generator_fn, make_handler};
use micro_h1::server::{Server, ServerConfig};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

// counts down from `ticks`, one chunk per write
fn countdown(exchange: &mut Exchange<'_>) {
    let ticks = exchange
        .get_header("X-Ticks")
        .and_then(|value| std::str::from_utf8(value).ok())
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(5);

    exchange.write_header("Content-Type", "text/plain");

    let mut left = ticks;
    exchange.stream(generator_fn(move || {
        if left == 0 {
            return Bytes::new();
        }
        left -= 1;
        Bytes::from(format!("{left}\n"))
    }));
    // sent as its own chunk, ahead of the countdown
    exchange.write("countdown started\n");
}

// an async generator: the connection waits on each tick
fn ticker(exchange: &mut Exchange<'_>) {
    exchange.write_header("Content-Type", "text/plain");
    let ticks = futures::stream::iter(0..5).then(|i| async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Bytes::from(format!("tick {i}\n"))
    });
    exchange.stream(ticks);
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let addr = std::env::var("MICRO_H1_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());
    let config = ServerConfig::builder().read_timeout(Some(Duration::from_secs(10))).build();

    let mut server = Server::with_config(
        config,
        make_handler(|exchange: &mut Exchange<'_>| match exchange.request().url().path() {
            Some(b"/ticker") => ticker(exchange),
            _ => countdown(exchange),
        }),
    );
    let local_addr = server.listen(addr).await.expect("bind server error");
    info!(%local_addr, "try: curl -N -H 'X-Ticks: 3' http://{local_addr}/ or http://{local_addr}/ticker");

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    server.stop();
    server.stopped().await;
}
