use super::{APP_LABEL, p};
use crate::{
    component::{
        Capabilities, Component,
        memcached::{self, Memcached, MemcachedOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub struct MemcachedAdapter;

impl Adapter for MemcachedAdapter {
    fn name(&self) -> &'static str {
        "memcached"
    }

    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = MemcachedOptions::builder().app_label(p(APP_LABEL)).build()?;
        Ok(Memcached::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        memcached::capabilities()
    }
}
