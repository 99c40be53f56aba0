use criterion::{Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use micro_h1::codec::{HeaderAccumulator, RequestParser};
use micro_h1::connection::{Exchange, HttpConnection, RequestAssembler, ResponseState};
use micro_h1::handler::make_handler;
use micro_h1::protocol::Request;
use micro_h1::server::ServerConfig;
use std::hint::black_box;
use std::{
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const SIMPLE_REQUEST: &[u8] = b"GET /index.html?lang=en HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";

// Mock IO: serves `read_data` once, then end of stream
struct MockIO {
    read_data: Vec<u8>,
    write_data: Vec<u8>,
    read_pos: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>) -> Self {
        Self { read_data, write_data: Vec::new(), read_pos: 0 }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.write_data.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

fn hello(exchange: &mut Exchange<'_>) {
    exchange.write_header("Content-Type", "text/plain");
    exchange.write("Hello World!");
}

fn bench_request_parser(c: &mut Criterion) {
    c.bench_function("parse_simple_request", |b| {
        b.iter(|| {
            let mut parser = RequestParser::default();
            let mut assembler = RequestAssembler::new();
            black_box(parser.execute(SIMPLE_REQUEST, &mut assembler).unwrap());
            black_box(assembler.take_request());
        });
    });

    c.bench_function("parse_fragmented_request", |b| {
        b.iter(|| {
            let mut parser = RequestParser::default();
            let mut assembler = RequestAssembler::new();
            for piece in SIMPLE_REQUEST.chunks(7) {
                black_box(parser.execute(piece, &mut assembler).unwrap());
            }
            black_box(assembler.take_request());
        });
    });
}

fn bench_header_accumulator(c: &mut Criterion) {
    c.bench_function("fold_header_fragments", |b| {
        b.iter(|| {
            let mut headers = HeaderAccumulator::new();
            for _ in 0..16 {
                headers.on_field(b"X-Fra");
                headers.on_field(b"gment");
                headers.on_value(b"some ");
                headers.on_value(b"value");
            }
            headers.finish();
            black_box(headers.take());
        });
    });
}

fn bench_response_compose(c: &mut Criterion) {
    let request = Request::default();

    c.bench_function("compose_buffered_response", |b| {
        b.iter(|| {
            let mut response = ResponseState::new();
            hello(&mut Exchange::new(&request, &mut response));
            black_box(response.compose(&request).unwrap());
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let handler = Arc::new(make_handler(hello));
    let config = Arc::new(ServerConfig::builder().read_timeout(None).build());

    c.bench_function("process_simple_request", |b| {
        b.iter(|| {
            let reader = MockIO::new(SIMPLE_REQUEST.to_vec());
            let writer = MockIO::new(Vec::new());
            let connection = HttpConnection::new(reader, writer, Arc::clone(&config));
            black_box(block_on(connection.process(Arc::clone(&handler))).unwrap());
        });
    });
}

criterion_group!(benches, bench_request_parser, bench_header_accumulator, bench_response_compose, bench_http_connection);
criterion_main!(benches);
