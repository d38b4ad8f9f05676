use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub default_shift_capacity: i32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            default_shift_capacity: 4,
        }
    }
}

impl TestConfig {
    /// Config pointed at a wiremock server standing in for Supabase.
    pub fn for_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.default_shift_capacity = capacity;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            default_shift_capacity: self.default_shift_capacity,
            shift_capacity_overrides: HashMap::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST row payloads for wiremock-backed tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn specialty_response(id: Uuid, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
        })
    }

    pub fn doctor_response(id: Uuid, specialty_id: Uuid, full_name: &str) -> Value {
        json!({
            "id": id,
            "specialty_id": specialty_id,
            "full_name": full_name,
        })
    }

    pub fn shift_template_response(id: Uuid, name: &str, start: &str, end: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "start_time": start,
            "end_time": end,
        })
    }

    pub fn assignment_response(
        id: Uuid,
        doctor_id: Uuid,
        shift_template_id: Uuid,
        work_date: NaiveDate,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "shift_template_id": shift_template_id,
            "work_date": work_date,
            "status": status,
            "cancel_reason": Value::Null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        })
    }

    pub fn appointment_response(
        id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        shift_template_id: Uuid,
        work_date: NaiveDate,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "shift_template_id": shift_template_id,
            "work_date": work_date,
            "status": status,
            "symptom_initial": Value::Null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        })
    }

    /// Minimal row shape returned by the booked-slot count query.
    pub fn booked_slot_response(doctor_id: Uuid, shift_template_id: Uuid) -> Value {
        json!({
            "doctor_id": doctor_id,
            "shift_template_id": shift_template_id,
        })
    }
}
