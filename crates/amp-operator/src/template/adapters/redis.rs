use super::{APP_LABEL, p};
use crate::{
    component::{
        Capabilities, Component,
        redis::{self, Redis, RedisOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const REDIS_IMAGE: &str = "REDIS_IMAGE";

pub struct RedisAdapter;

impl Adapter for RedisAdapter {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(REDIS_IMAGE)
                .with_description("Redis image to use")
                .with_value("registry.access.redhat.com/rhscl/redis-32-rhel7:3.2"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = RedisOptions::builder().app_label(p(APP_LABEL)).build()?;
        Ok(Redis::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = redis::capabilities();
        capabilities
            .external_database_parameters
            .insert(REDIS_IMAGE.to_owned());
        capabilities
    }
}
