use std::collections::HashMap;
use std::env;

use tracing::warn;
use uuid::Uuid;

/// Per-shift appointment capacity used when no override is configured.
pub const DEFAULT_SHIFT_CAPACITY: i32 = 4;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub default_shift_capacity: i32,
    pub shift_capacity_overrides: HashMap<Uuid, i32>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            default_shift_capacity: env::var("DEFAULT_SHIFT_CAPACITY")
                .ok()
                .and_then(|raw| raw.parse::<i32>().ok())
                .filter(|capacity| *capacity > 0)
                .unwrap_or_else(|| {
                    warn!(
                        "DEFAULT_SHIFT_CAPACITY not set or invalid, using {}",
                        DEFAULT_SHIFT_CAPACITY
                    );
                    DEFAULT_SHIFT_CAPACITY
                }),
            shift_capacity_overrides: parse_capacity_overrides(
                env::var("SHIFT_CAPACITY_OVERRIDES").ok().as_deref(),
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Maximum PENDING/CONFIRMED appointments allowed against one
    /// (doctor, shift template, date) tuple.
    pub fn capacity_for_shift(&self, shift_template_id: Uuid) -> i32 {
        self.shift_capacity_overrides
            .get(&shift_template_id)
            .copied()
            .unwrap_or(self.default_shift_capacity)
    }
}

/// Parses `SHIFT_CAPACITY_OVERRIDES`, a comma list of `<template-uuid>:<n>`
/// entries. Malformed entries are skipped with a warning.
fn parse_capacity_overrides(raw: Option<&str>) -> HashMap<Uuid, i32> {
    let mut overrides = HashMap::new();

    let Some(raw) = raw else {
        return overrides;
    };

    for entry in raw.split(',').filter(|entry| !entry.trim().is_empty()) {
        let parsed = entry.split_once(':').and_then(|(id, capacity)| {
            let id = Uuid::parse_str(id.trim()).ok()?;
            let capacity = capacity.trim().parse::<i32>().ok().filter(|c| *c > 0)?;
            Some((id, capacity))
        });

        match parsed {
            Some((id, capacity)) => {
                overrides.insert(id, capacity);
            }
            None => warn!("Ignoring malformed shift capacity override entry: {}", entry),
        }
    }

    overrides
}
