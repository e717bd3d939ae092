// calls.rs
use crate::errors::CrmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
    Rejected,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogItem {
    pub phone_number: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub call_type: CallType,
    /// Epoch milliseconds.
    pub date: i64,
    /// Seconds.
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopContact {
    pub name: String,
    pub phone_number: String,
    pub total_duration: u64,
    pub call_count: u32,
}

/// The device call log, in whatever order the platform keeps it.
#[async_trait]
pub trait CallLogSource: Send + Sync {
    async fn call_log(&self) -> Result<Vec<CallLogItem>, CrmError>;
}

/// Newest calls first, at most `limit`.
pub fn recent_calls(mut items: Vec<CallLogItem>, limit: usize) -> Vec<CallLogItem> {
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(limit);
    items
}

/// Contacts ranked by total talk time.
///
/// Calls are grouped by display name (the number when the contact has no
/// name) together with the number. Ties keep first-seen order.
pub fn top_contacts_by_duration(items: &[CallLogItem], limit: usize) -> Vec<TopContact> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut stats: HashMap<(String, String), TopContact> = HashMap::new();

    for item in items {
        let display = item.name.clone().unwrap_or_else(|| item.phone_number.clone());
        let key = (display.clone(), item.phone_number.clone());

        let entry = stats.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            TopContact {
                name: display,
                phone_number: item.phone_number.clone(),
                total_duration: 0,
                call_count: 0,
            }
        });
        entry.total_duration += u64::from(item.duration);
        entry.call_count += 1;
    }

    let mut ranked: Vec<TopContact> = order
        .into_iter()
        .filter_map(|key| stats.remove(&key))
        .collect();
    ranked.sort_by(|a, b| b.total_duration.cmp(&a.total_duration));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, Default)]
pub struct CallLogsState {
    pub call_logs: Vec<CallLogItem>,
    pub top_contacts: Vec<TopContact>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct CallLogs<S> {
    source: S,
    state: CallLogsState,
}

impl<S: CallLogSource> CallLogs<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: CallLogsState::default(),
        }
    }

    pub fn state(&self) -> &CallLogsState {
        &self.state
    }

    async fn load(&mut self) -> Result<Vec<CallLogItem>, CrmError> {
        self.state.is_loading = true;
        self.state.error = None;

        let result = self.source.call_log().await;
        self.state.is_loading = false;
        if let Err(e) = &result {
            warn!(error = %e, "reading call log failed");
            self.state.error = Some(e.to_string());
        }
        result
    }

    pub async fn fetch_call_logs(&mut self, limit: usize) -> Result<(), CrmError> {
        let items = self.load().await?;
        self.state.call_logs = recent_calls(items, limit);
        debug!(count = self.state.call_logs.len(), "call log loaded");
        Ok(())
    }

    pub async fn fetch_top_contacts(&mut self, limit: usize) -> Result<(), CrmError> {
        let items = self.load().await?;
        self.state.top_contacts = top_contacts_by_duration(&items, limit);
        debug!(count = self.state.top_contacts.len(), "top contacts computed");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.state.call_logs.clear();
        self.state.top_contacts.clear();
        self.state.error = None;
    }
}
