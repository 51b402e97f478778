// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Poll loops run after apply and delete

use super::jsonpath::JsonPath;
use super::model::{WaitForDelete, WaitForUpsert};
use crate::error::{ProviderError, Result};
use crate::kubernetes::{DynamicApi, ObjectKey};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

/// Shortest pause between two polls
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

fn poll_interval(secs: u64) -> Duration {
    Duration::from_secs(secs).max(MIN_POLL_INTERVAL)
}

/// `None` when the timeout reaches past what `Instant` can represent
fn deadline(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Time to sleep before the next poll, or `None` once the deadline has passed
fn next_pause(interval: Duration, deadline: Option<Instant>) -> Option<Duration> {
    let Some(deadline) = deadline else {
        return Some(interval);
    };
    let now = Instant::now();
    (now < deadline).then(|| interval.min(deadline - now))
}

/// A parsed wait-for-upsert condition
#[derive(Clone, Debug)]
pub struct Condition {
    path: JsonPath,
    value: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl Condition {
    /// Parse the JSONPath up front so a bad expression fails before anything is applied.
    pub fn compile(wait: &WaitForUpsert) -> Result<Self> {
        Ok(Self {
            path: JsonPath::parse(&wait.jsonpath)?,
            value: wait.value.clone(),
            timeout: Duration::from_secs(wait.timeout),
            poll_interval: poll_interval(wait.poll_interval),
        })
    }

    /// With a value the first result must equal it, without one it must be non-empty.
    pub fn is_met(&self, object: &Value) -> bool {
        let Some(first) = self.path.evaluate(object).into_iter().next() else {
            return false;
        };
        match &self.value {
            Some(expected) => display(first) == *expected,
            None => !is_empty(first),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.path, value),
            None => write!(f, "{}", self.path),
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Wait for every condition in order, each within its own timeout.
pub async fn wait_for_upsert(api: &DynamicApi, key: &ObjectKey, conditions: &[Condition]) -> Result<()> {
    for condition in conditions {
        wait_for_condition(api, key, condition).await?;
    }
    Ok(())
}

#[instrument(skip(api, condition), fields(key = %key, condition = %condition))]
async fn wait_for_condition(api: &DynamicApi, key: &ObjectKey, condition: &Condition) -> Result<()> {
    let deadline = deadline(condition.timeout);

    loop {
        match api.get(key).await {
            Ok(Some(object)) if condition.is_met(&object) => {
                info!("{} reached {}", key, condition);
                return Ok(());
            }
            Ok(Some(_)) => debug!("{} has not reached {} yet", key, condition),
            Ok(None) => debug!("{} does not exist yet", key),
            Err(e) => warn!("Failed to check {}, retrying: {}", key, e),
        }

        let Some(pause) = next_pause(condition.poll_interval, deadline) else {
            return Err(ProviderError::WaitTimeoutExceeded {
                key: key.clone(),
                target: format!("match {}", condition),
                timeout: condition.timeout,
            });
        };
        sleep(pause).await;
    }
}

/// Poll until the object is gone. A zero timeout checks exactly once and
/// succeeds whatever the outcome.
#[instrument(skip(api, wait), fields(key = %key, timeout = wait.timeout))]
pub async fn wait_for_delete(api: &DynamicApi, key: &ObjectKey, wait: &WaitForDelete) -> Result<()> {
    let timeout = Duration::from_secs(wait.timeout);
    let interval = poll_interval(wait.poll_interval);
    let deadline = deadline(timeout);

    loop {
        match api.get(key).await {
            Ok(None) => {
                info!("{} is gone", key);
                return Ok(());
            }
            Ok(Some(_)) => debug!("{} still exists", key),
            Err(e) => warn!("Failed to check {}, retrying: {}", key, e),
        }

        if timeout.is_zero() {
            debug!("Wait timeout is 0, not waiting for {} to disappear", key);
            return Ok(());
        }

        let Some(pause) = next_pause(interval, deadline) else {
            return Err(ProviderError::WaitTimeoutExceeded {
                key: key.clone(),
                target: "be deleted".to_string(),
                timeout,
            });
        };
        sleep(pause).await;
    }
}
