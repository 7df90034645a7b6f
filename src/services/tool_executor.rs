use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::GatewayError;
use crate::services::logger::Logger;

/// A function the LLM may call. Errors are folded into the tool result by
/// [`ToolExecutor::execute`], so implementations may freely use `?`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, GatewayError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Always yields a JSON payload suitable for a `role: "tool"` message.
    pub async fn execute(&self, name: &str, args: Value) -> Value {
        let started = std::time::Instant::now();
        let Some(handler) = self.handlers.get(name) else {
            self.logger.warn(
                "Unknown function requested",
                Some(&serde_json::json!({ "function": name })),
            );
            return serde_json::json!({
                "success": false,
                "error": format!("Unknown function: {}", name),
            });
        };

        match handler.handle(args).await {
            Ok(result) => {
                self.logger.info(
                    "Function executed",
                    Some(&serde_json::json!({
                        "function": name,
                        "duration_ms": started.elapsed().as_millis() as u64,
                        "success": result.get("success").cloned().unwrap_or(Value::Bool(true)),
                    })),
                );
                result
            }
            Err(err) => {
                self.logger.warn(
                    "Function failed",
                    Some(&serde_json::json!({
                        "function": name,
                        "duration_ms": started.elapsed().as_millis() as u64,
                        "error": err.message,
                    })),
                );
                serde_json::json!({ "success": false, "error": err.message })
            }
        }
    }
}
