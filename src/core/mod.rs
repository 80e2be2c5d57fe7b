// Core modules: input resolution, content validation, upload orchestration, errors.
pub mod error;
pub mod ingest;
pub mod sniff;
pub mod source;
