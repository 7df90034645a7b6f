pub mod multipart;
pub mod redact;
pub mod text;
