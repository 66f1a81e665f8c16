use super::{APP_LABEL, p};
use crate::{
    component::{
        Capabilities,
        high_availability::{self, HighAvailabilityOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const SYSTEM_DATABASE_URL: &str = "SYSTEM_DATABASE_URL";
pub const SYSTEM_REDIS_URL: &str = "SYSTEM_REDIS_URL";
pub const BACKEND_REDIS_STORAGE_ENDPOINT: &str = "BACKEND_REDIS_STORAGE_ENDPOINT";
pub const BACKEND_REDIS_QUEUES_ENDPOINT: &str = "BACKEND_REDIS_QUEUES_ENDPOINT";

/// Declares the endpoints of the external databases.
///
/// The objects of the highly available variant replace objects of other components, so they are
/// contributed by [`crate::transform::high_availability`] rather than appended here.
pub struct HighAvailabilityAdapter;

impl HighAvailabilityAdapter {
    /// Options whose endpoints reference this adapter's parameters.
    pub fn options() -> Result<HighAvailabilityOptions, options::Error> {
        HighAvailabilityOptions::builder()
            .app_label(p(APP_LABEL))
            .system_database_url(p(SYSTEM_DATABASE_URL))
            .system_redis_url(p(SYSTEM_REDIS_URL))
            .backend_redis_storage_endpoint(p(BACKEND_REDIS_STORAGE_ENDPOINT))
            .backend_redis_queues_endpoint(p(BACKEND_REDIS_QUEUES_ENDPOINT))
            .build()
    }
}

impl Adapter for HighAvailabilityAdapter {
    fn name(&self) -> &'static str {
        "high-availability"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(BACKEND_REDIS_STORAGE_ENDPOINT)
                .with_description("Define the external backend-redis storage endpoint to be used"),
            Parameter::required(BACKEND_REDIS_QUEUES_ENDPOINT)
                .with_description("Define the external backend-redis queues endpoint to be used"),
            Parameter::required(SYSTEM_REDIS_URL)
                .with_description("Define the external system-redis to connect to"),
            Parameter::required(SYSTEM_DATABASE_URL)
                .with_description("Define the external system-mysql to connect to"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        Ok(Vec::new())
    }

    fn capabilities(&self) -> Capabilities {
        high_availability::capabilities()
    }
}
