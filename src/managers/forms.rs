use crate::errors::GatewayError;
use crate::services::form_store::FormStore;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use bytes::Bytes;
use serde_json::{Map, Value};

/// HTTP-facing rules around [`FormStore`]: body and id validation, response envelopes.
#[derive(Clone)]
pub struct FormsManager {
    logger: Logger,
    validation: Validation,
    store: FormStore,
}

fn require_json_content_type(content_type: Option<&str>) -> Result<(), GatewayError> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);
    if is_json {
        Ok(())
    } else {
        Err(GatewayError::invalid_params("Content-Type must be application/json"))
    }
}

impl FormsManager {
    pub fn new(logger: Logger, validation: Validation, store: FormStore) -> Self {
        Self {
            logger: logger.child("forms"),
            validation,
            store,
        }
    }

    pub fn parse_id(&self, raw: &str) -> Result<i64, GatewayError> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                GatewayError::invalid_params("Invalid ID format")
                    .with_details(serde_json::json!({ "id": raw }))
            })
    }

    fn parse_object(
        &self,
        content_type: Option<&str>,
        body: &Bytes,
    ) -> Result<Map<String, Value>, GatewayError> {
        require_json_content_type(content_type)?;
        let value: Value = serde_json::from_slice(body).map_err(|_| {
            GatewayError::invalid_params("Request body must be a valid JSON object")
        })?;
        self.validation
            .ensure_object(&value, "Request body")
            .map_err(|_| GatewayError::invalid_params("Request body must be a valid JSON object"))
    }

    pub async fn create(&self, content_type: Option<&str>, body: &Bytes) -> Result<Value, GatewayError> {
        let data = self.parse_object(content_type, body)?;
        let stored = self.store.insert(data).await?;
        Ok(serde_json::json!({
            "success": true,
            "message": "Data stored successfully",
            "data": stored,
        }))
    }

    pub async fn list(&self, limit: Option<&str>, offset: Option<&str>) -> Result<Value, GatewayError> {
        let (limit, offset) = self.validation.ensure_page(limit, offset)?;
        let rows = self.store.list(limit, offset).await?;
        self.logger.debug(
            "Listed forms",
            Some(&serde_json::json!({ "limit": limit, "offset": offset, "count": rows.len() })),
        );
        Ok(serde_json::json!({
            "success": true,
            "message": "Data retrieved successfully",
            "pagination": {
                "limit": limit,
                "offset": offset,
                "count": rows.len(),
            },
            "data": rows,
        }))
    }

    pub async fn get(&self, raw_id: &str) -> Result<Value, GatewayError> {
        let id = self.parse_id(raw_id)?;
        let row = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| GatewayError::not_found("Data not found"))?;
        Ok(serde_json::json!({
            "success": true,
            "message": "Data retrieved successfully",
            "data": row,
        }))
    }

    pub async fn update(
        &self,
        raw_id: &str,
        content_type: Option<&str>,
        body: &Bytes,
    ) -> Result<Value, GatewayError> {
        let id = self.parse_id(raw_id)?;
        let data = self.parse_object(content_type, body)?;
        let row = self
            .store
            .update(id, data)
            .await?
            .ok_or_else(|| GatewayError::not_found("Data not found"))?;
        Ok(serde_json::json!({
            "success": true,
            "message": "Data updated successfully",
            "data": row,
        }))
    }

    pub async fn delete(&self, raw_id: &str) -> Result<Value, GatewayError> {
        let id = self.parse_id(raw_id)?;
        if !self.store.delete(id).await? {
            return Err(GatewayError::not_found("Data not found"));
        }
        Ok(serde_json::json!({
            "success": true,
            "message": "Data deleted successfully",
        }))
    }
}
