//! Core HTTP protocol types.
//!
//! - **Request model** (`request`, `url`): the structured [`Request`] built
//!   by the connection, its ordered [`HeaderEntry`] list and the decomposed [`Url`]
//! - **Payload items** (`payload`): [`PayloadItem`] and [`PayloadSize`] shared
//!   by the body decoders and the chunk encoder
//! - **Status table** (`status`): reason phrases for status lines
//! - **Error handling** (`error`): [`HttpError`], [`ParseError`], [`SendError`]
//!   and [`ServerError`]

mod payload;
pub use payload::PayloadItem;
pub use payload::PayloadSize;

mod request;
pub use request::HeaderEntry;
pub use request::Request;
pub(crate) use request::version_str;

mod url;
pub use url::Url;

mod status;
pub use status::status_reason;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::ServerError;
