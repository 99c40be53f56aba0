use micro_h1::connection::Exchange;
use micro_h1::handler::make_handler;
use micro_h1::server::Server;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn hello_world(exchange: &mut Exchange<'_>) {
    let request = exchange.request();
    let path = String::from_utf8_lossy(request.url().path().unwrap_or(&b"/"[..])).into_owned();
    info!(method = %request.method(), %path, "request received");

    if path != "/" {
        exchange.write_status(404);
        exchange.write("404 not found\r\n");
        return;
    }

    exchange.write_header("Content-Type", "text/plain");
    exchange.write("hello world\r\n");
    exchange.end();
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let addr = std::env::var("MICRO_H1_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());

    let mut server = Server::new(make_handler(hello_world));
    let local_addr = server.listen(addr).await.expect("bind server error");
    info!(%local_addr, "try: curl -v http://{local_addr}/");

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    server.stop();
    server.stopped().await;
}
