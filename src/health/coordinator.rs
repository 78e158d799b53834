// src/health/coordinator.rs
use crate::health::{Batch, Prober, ServiceStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Fans one probe per service out onto the runtime and gathers the results
/// into a complete [`Batch`].
#[derive(Clone)]
pub struct Coordinator {
    prober: Arc<dyn Prober>,
}

impl Coordinator {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Probe every entry of `services` concurrently and wait for all of them.
    ///
    /// The returned batch always has exactly `services.len()` entries. A probe
    /// task that dies without reporting is recorded as unhealthy.
    pub async fn collect(&self, services: &[String]) -> Batch {
        let expected = services.len();
        // One slot per task, so no sender ever waits for the drain below.
        let (tx, mut rx) = mpsc::channel::<(usize, ServiceStatus)>(expected.max(1));

        for (slot, service) in services.iter().enumerate() {
            let tx = tx.clone();
            let prober = self.prober.clone();
            let service = service.clone();

            tokio::spawn(async move {
                let status = prober.probe(&service).await;
                let _ = tx.send((slot, status)).await;
            });
        }
        drop(tx);

        debug!(
            "Dispatched {} probes using {}",
            expected,
            self.prober.name()
        );

        let mut slots: Vec<Option<ServiceStatus>> = vec![None; expected];
        while let Some((slot, status)) = rx.recv().await {
            slots[slot] = Some(status);
        }

        let statuses = slots
            .into_iter()
            .zip(services)
            .map(|(status, name)| {
                status.unwrap_or_else(|| {
                    error!("Probe task for {} ended without a result, marking unhealthy", name);
                    ServiceStatus::unhealthy(name.as_str())
                })
            })
            .collect();

        Batch::new(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedProber {
        healthy: HashSet<String>,
        calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn new(healthy: &[&str]) -> Self {
            Self {
                healthy: healthy.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, service: &str) -> ServiceStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Finish out of order to make sure results are keyed by slot.
            let delay = (service.len() % 3) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            ServiceStatus::new(service, self.healthy.contains(service))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct PanickingProber;

    #[async_trait]
    impl Prober for PanickingProber {
        async fn probe(&self, service: &str) -> ServiceStatus {
            if service == "boom" {
                panic!("probe for {} exploded", service);
            }
            ServiceStatus::healthy(service)
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn names(services: &[&str]) -> Vec<String> {
        services.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_collect_probes_every_service() {
        let prober = Arc::new(ScriptedProber::new(&["nginx", "sshd"]));
        let coordinator = Coordinator::new(prober.clone());

        let batch = coordinator
            .collect(&names(&["nginx", "sshd", "postgres"]))
            .await;

        assert_eq!(batch.len(), 3);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
        assert_eq!(batch.healthy_count(), 2);
        assert!(batch.get("nginx").unwrap().healthy);
        assert!(batch.get("sshd").unwrap().healthy);
        assert!(!batch.get("postgres").unwrap().healthy);
    }

    #[tokio::test]
    async fn test_collect_empty_service_list() {
        let prober = Arc::new(ScriptedProber::new(&[]));
        let coordinator = Coordinator::new(prober.clone());

        let batch = coordinator.collect(&[]).await;

        assert!(batch.is_empty());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_services_are_probed_twice() {
        let prober = Arc::new(ScriptedProber::new(&["nginx"]));
        let coordinator = Coordinator::new(prober.clone());

        let batch = coordinator.collect(&names(&["nginx", "nginx"])).await;

        assert_eq!(batch.len(), 2);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
        assert!(batch.iter().all(|s| s.name == "nginx" && s.healthy));
    }

    #[tokio::test]
    async fn test_panicked_probe_is_reported_unhealthy() {
        let coordinator = Coordinator::new(Arc::new(PanickingProber));

        let batch = coordinator
            .collect(&names(&["nginx", "boom", "sshd"]))
            .await;

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.get("boom"), Some(&ServiceStatus::unhealthy("boom")));
        assert!(batch.get("nginx").unwrap().healthy);
        assert!(batch.get("sshd").unwrap().healthy);
    }

    proptest! {
        #[test]
        fn batch_size_matches_fan_out(services in prop::collection::vec("[a-z]{1,8}", 0..16)) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let healthy: Vec<&str> = services.iter().step_by(2).map(String::as_str).collect();
            let coordinator = Coordinator::new(Arc::new(ScriptedProber::new(&healthy)));

            let batch = runtime.block_on(coordinator.collect(&services));

            prop_assert_eq!(batch.len(), services.len());
            let mut expected = services.clone();
            let mut collected: Vec<String> = batch.into_iter().map(|s| s.name).collect();
            expected.sort();
            collected.sort();
            prop_assert_eq!(collected, expected);
        }
    }
}
