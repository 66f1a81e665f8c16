use super::{APP_LABEL, TENANT_NAME, WILDCARD_DOMAIN, p};
use crate::{
    component::{
        Capabilities, Component,
        backend::{self, Backend, BackendOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub struct BackendAdapter;

impl Adapter for BackendAdapter {
    fn name(&self) -> &'static str {
        "backend"
    }

    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = BackendOptions::builder()
            .app_label(p(APP_LABEL))
            .system_backend_username(p(super::system::SYSTEM_BACKEND_USERNAME))
            .system_backend_password(p(super::system::SYSTEM_BACKEND_PASSWORD))
            .tenant_name(p(TENANT_NAME))
            .wildcard_domain(p(WILDCARD_DOMAIN))
            .build()?;
        Ok(Backend::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        backend::capabilities()
    }
}
