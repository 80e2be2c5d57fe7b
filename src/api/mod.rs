//! Purpose: Public surface of the S.EE API client used by the CLI and tests.
//! Exports: `SeeClient`, `ClientConfig`, request/response types, and the error model.
//! Role: Remote collaborator boundary; the core never depends on transport details.
//! Invariants: Only this module talks HTTP.

mod message;
mod remote;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use message::{
    Ack, CreateShortUrlRequest, CreateTextRequest, DEFAULT_DOMAIN, ShortLink, SlugRef, Tag,
    UpdateShortUrlRequest, UpdateTextRequest, UploadedFile,
};
pub use remote::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, SeeClient};
