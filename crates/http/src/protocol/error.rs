use std::io;
use thiserror::Error;

/// Top-level error returned when a connection stops abnormally.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("connection idle for longer than the read timeout")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("body size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeBody { current_size: u64, max_size: u64 },

    #[error("connection closed in the middle of a message")]
    Incomplete,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn too_large_body(current_size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { current_size, max_size }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Errors raised while setting up the listening side of a [`Server`](crate::server::Server).
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind listener: {source}")]
    Bind {
        #[from]
        source: io::Error,
    },

    #[error("server is already listening on {0}")]
    AlreadyListening(std::net::SocketAddr),
}
