use super::{APP_LABEL, WILDCARD_DOMAIN, p};
use crate::{
    component::{
        Capabilities, Component,
        wildcard_router::{self, WildcardRouter, WildcardRouterOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const WILDCARD_POLICY: &str = "WILDCARD_POLICY";

pub struct WildcardRouterAdapter;

impl Adapter for WildcardRouterAdapter {
    fn name(&self) -> &'static str {
        "wildcard-router"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(WILDCARD_DOMAIN).with_description(
                "Root domain for the wildcard routes. Eg. example.com will generate 3scale-admin.example.com.",
            ),
            Parameter::required(WILDCARD_POLICY)
                .with_description(
                    "Use \"Subdomain\" to create a wildcard route for apicast wildcard router",
                )
                .with_value("None"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = WildcardRouterOptions::builder()
            .app_label(p(APP_LABEL))
            .wildcard_domain(p(WILDCARD_DOMAIN))
            .wildcard_policy(p(WILDCARD_POLICY))
            .build()?;
        Ok(WildcardRouter::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        wildcard_router::capabilities()
    }
}
