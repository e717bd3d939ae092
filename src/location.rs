// location.rs
use crate::errors::CrmError;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    /// Upper bound on one position request.
    pub timeout: Duration,
    /// A previous fix younger than this is reused.
    pub max_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(10),
        }
    }
}

/// Raw position as the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub accuracy: f64,
    pub altitude: Option<f64>,
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub altitude: Option<f64>,
    /// Local time of the fix, for display.
    pub timestamp: String,
}

impl From<LocationFix> for LocationData {
    fn from(fix: LocationFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
            altitude: fix.altitude,
            timestamp: format_local_timestamp(fix.timestamp_ms),
        }
    }
}

pub fn format_local_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(t) => t.format("%d.%m.%Y, %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self, high_accuracy: bool) -> Result<LocationFix, CrmError>;
}

pub struct LocationTracker<S> {
    source: S,
    options: LocationOptions,
    last_fix: Option<LocationFix>,
    pub current_location: Option<LocationData>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<S: LocationSource> LocationTracker<S> {
    pub fn new(source: S, options: LocationOptions) -> Self {
        Self {
            source,
            options,
            last_fix: None,
            current_location: None,
            is_loading: false,
            error: None,
        }
    }

    fn cached_fix(&self, now: DateTime<Utc>) -> Option<LocationFix> {
        let fix = self.last_fix?;
        let age_ms = now.timestamp_millis() - fix.timestamp_ms;
        let max_age_ms = i64::try_from(self.options.max_age.as_millis()).unwrap_or(i64::MAX);
        (0..=max_age_ms).contains(&age_ms).then_some(fix)
    }

    pub async fn fetch(&mut self) -> Result<LocationData, CrmError> {
        self.is_loading = true;
        self.error = None;

        let fix = match self.cached_fix(Utc::now()) {
            Some(fix) => {
                debug!("reusing recent location fix");
                Ok(fix)
            }
            None => {
                let request = self.source.current_position(self.options.high_accuracy);
                match tokio::time::timeout(self.options.timeout, request).await {
                    Ok(result) => result,
                    Err(_) => Err(CrmError::Timeout(self.options.timeout)),
                }
            }
        };

        self.is_loading = false;
        match fix {
            Ok(fix) => {
                self.last_fix = Some(fix);
                let data = LocationData::from(fix);
                self.current_location = Some(data.clone());
                Ok(data)
            }
            Err(e) => {
                warn!(error = %e, "location fetch failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.current_location = None;
        self.error = None;
    }
}
