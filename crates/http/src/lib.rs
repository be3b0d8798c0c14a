//! Request body model and content decoders for the relay request pipeline.
//!
//! This crate turns the buffered bytes of an inbound request into a structured
//! [`Body`](protocol::Body). It knows nothing about sockets or routing: a transport
//! adapter hands over the payload and its `content-type` header, the
//! [`DecoderRegistry`](codec::DecoderRegistry) picks a decoder and returns the result.
//!
//! # Architecture
//!
//! - [`protocol`]: body model ([`Body`](protocol::Body), multipart results) and
//!   [`DecodeError`](protocol::DecodeError)
//! - [`codec`]: the [`ContentDecoder`](codec::ContentDecoder) trait, built-in decoders
//!   and the registry
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use relay_http::codec::{DecoderRegistry, MultipartConfig};
//! use relay_http::protocol::Body;
//!
//! let registry = DecoderRegistry::with_defaults(MultipartConfig::default().with_max_file_size(1024));
//!
//! let payload = Bytes::from_static(
//!     b"--b\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\nhello\r\n--b--\r\n",
//! );
//! let body = registry.decode(payload, Some("multipart/form-data; boundary=b")).unwrap();
//!
//! let Body::Multipart(multipart) = body else { panic!("expected multipart") };
//! assert_eq!(multipart.files()[0].size(), 5);
//! ```
//!
//! # Limits
//!
//! Multipart uploads are bounded by [`MultipartConfig`](codec::MultipartConfig):
//! number of parts, header block size, text field size and file size. Exceeding any of
//! them fails the whole decode with a limit error.

pub mod codec;
pub mod protocol;

mod utils;
