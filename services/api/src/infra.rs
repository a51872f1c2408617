use hostel_allot::workflows::allotment::{
    AllotmentPolicy, AllotmentService, EligibilityOrder, InMemoryHostelRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryAllotmentService = AllotmentService<InMemoryHostelRepository>;

/// Fresh in-memory store wrapped in a service using `policy`.
pub(crate) fn in_memory_service(
    policy: AllotmentPolicy,
) -> (MemoryAllotmentService, Arc<InMemoryHostelRepository>) {
    let repository = Arc::new(InMemoryHostelRepository::default());
    let service = AllotmentService::new(repository.clone(), policy);
    (service, repository)
}

/// Clap value parser for eligibility orders.
pub(crate) fn parse_order(raw: &str) -> Result<EligibilityOrder, String> {
    raw.parse()
}

/// Clap value parser for cutoffs; zero is rejected before any file is read.
pub(crate) fn parse_cutoff(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("category cutoff must be at least 1".to_string()),
        Ok(value) => Ok(value),
        Err(err) => Err(format!("failed to parse '{raw}' as a cutoff ({err})")),
    }
}
