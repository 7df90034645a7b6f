pub mod email;
pub mod forms;
pub mod netlify;
pub mod openapi;
pub mod proxy;
