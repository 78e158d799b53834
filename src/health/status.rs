// src/health/status.rs
use chrono::{DateTime, Utc};

/// Result of one readiness check for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub name: String,
    pub healthy: bool,
}

impl ServiceStatus {
    pub fn new(name: impl Into<String>, healthy: bool) -> Self {
        Self {
            name: name.into(),
            healthy,
        }
    }

    pub fn healthy(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn unhealthy(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Gauge value: 1 when healthy, 0 otherwise.
    pub fn value(&self) -> i64 {
        if self.healthy {
            1
        } else {
            0
        }
    }
}

/// Every status produced by one polling cycle.
#[derive(Debug)]
pub struct Batch {
    statuses: Vec<ServiceStatus>,
    collected_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(statuses: Vec<ServiceStatus>) -> Self {
        Self {
            statuses,
            collected_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn healthy_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.healthy).count()
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceStatus> {
        self.statuses.iter()
    }

    /// Status for `name`; the first one wins when a service is configured twice.
    pub fn get(&self, name: &str) -> Option<&ServiceStatus> {
        self.statuses.iter().find(|s| s.name == name)
    }
}

impl IntoIterator for Batch {
    type Item = ServiceStatus;
    type IntoIter = std::vec::IntoIter<ServiceStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.statuses.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_value() {
        assert_eq!(ServiceStatus::healthy("nginx").value(), 1);
        assert_eq!(ServiceStatus::unhealthy("nginx").value(), 0);
    }

    #[test]
    fn test_batch_counts() {
        let batch = Batch::new(vec![
            ServiceStatus::healthy("nginx"),
            ServiceStatus::unhealthy("sshd"),
            ServiceStatus::healthy("redis"),
        ]);

        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
        assert_eq!(batch.healthy_count(), 2);
        assert_eq!(batch.get("sshd"), Some(&ServiceStatus::unhealthy("sshd")));
        assert_eq!(batch.get("postgres"), None);

        let names: Vec<String> = batch.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["nginx", "sshd", "redis"]);
    }
}
