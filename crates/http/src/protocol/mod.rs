//! Request body model shared by the decoders and the web layer.
//!
//! - [`Body`]: the decoded form of a request payload
//! - [`MultipartResult`] / [`MultipartFile`]: the fields and files of a multipart upload
//! - [`DecodeError`]: content-parsing and limit failures raised by decoders

mod body;
pub use body::Body;

mod multipart;
pub use multipart::MultipartFile;
pub use multipart::MultipartResult;

mod error;
pub use error::DecodeError;
