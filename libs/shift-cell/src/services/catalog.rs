// libs/shift-cell/src/services/catalog.rs
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{ShiftError, ShiftTemplate};

/// Read access to the shift template reference data.
pub struct ShiftCatalogService {
    supabase: SupabaseClient,
}

impl ShiftCatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_templates(&self, auth_token: &str) -> Result<Vec<ShiftTemplate>, ShiftError> {
        debug!("Listing shift templates");

        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/shift_templates?order=start_time.asc",
                Some(auth_token),
                None,
            )
            .await?;

        let templates: Vec<ShiftTemplate> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ShiftTemplate>, _>>()
            .map_err(|e| ShiftError::DatabaseError(format!("Failed to parse shift templates: {}", e)))?;

        Ok(templates)
    }

    pub async fn get_template(
        &self,
        template_id: Uuid,
        auth_token: &str,
    ) -> Result<ShiftTemplate, ShiftError> {
        debug!("Fetching shift template: {}", template_id);

        let path = format!("/rest/v1/shift_templates?id=eq.{}", template_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(ShiftError::TemplateNotFound);
        }

        let template: ShiftTemplate = serde_json::from_value(result[0].clone())
            .map_err(|e| ShiftError::DatabaseError(format!("Failed to parse shift template: {}", e)))?;

        Ok(template)
    }
}
