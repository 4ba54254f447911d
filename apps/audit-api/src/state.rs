use std::sync::Arc;

use audit_service::AuditService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AuditService>,
}
impl AppState {
	pub fn new(config: audit_config::Config) -> color_eyre::Result<Self> {
		let service = AuditService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: AuditService) -> Self {
		Self { service: Arc::new(service) }
	}
}
