pub mod operations;
pub mod spec;
pub mod tool;

pub use operations::ApiOperation;
pub use spec::{SpecDocument, SpecSummary};
pub use tool::{ToolCall, ToolOptions};
