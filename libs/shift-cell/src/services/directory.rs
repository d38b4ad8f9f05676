// libs/shift-cell/src/services/directory.rs
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, ShiftError, Specialty};

/// Lookups against the specialty and doctor directories. These are external
/// collaborators of the scheduling core; only their read contracts live here.
pub struct DirectoryService {
    supabase: SupabaseClient,
}

impl DirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_specialty(
        &self,
        specialty_id: Uuid,
        auth_token: &str,
    ) -> Result<Specialty, ShiftError> {
        debug!("Fetching specialty: {}", specialty_id);

        let path = format!("/rest/v1/specialties?id=eq.{}", specialty_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(ShiftError::SpecialtyNotFound);
        }

        let specialty: Specialty = serde_json::from_value(result[0].clone())
            .map_err(|e| ShiftError::DatabaseError(format!("Failed to parse specialty: {}", e)))?;

        Ok(specialty)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Doctor, ShiftError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(ShiftError::DoctorNotFound);
        }

        let doctor: Doctor = serde_json::from_value(result[0].clone())
            .map_err(|e| ShiftError::DatabaseError(format!("Failed to parse doctor: {}", e)))?;

        Ok(doctor)
    }

    pub async fn list_doctors_by_specialty(
        &self,
        specialty_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, ShiftError> {
        debug!("Listing doctors for specialty: {}", specialty_id);

        let path = format!(
            "/rest/v1/doctors?specialty_id=eq.{}&order=id.asc",
            specialty_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let doctors: Vec<Doctor> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| ShiftError::DatabaseError(format!("Failed to parse doctors: {}", e)))?;

        Ok(doctors)
    }
}
