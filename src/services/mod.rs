pub mod form_store;
pub mod http_client;
pub mod logger;
pub mod tool_executor;
pub mod validation;
