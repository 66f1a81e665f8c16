use super::{APP_LABEL, GENERATED_SECRET, TENANT_NAME, WILDCARD_DOMAIN, p};
use crate::{
    component::{
        Capabilities, Component,
        apicast::{self, Apicast, ApicastOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const APICAST_ACCESS_TOKEN: &str = "APICAST_ACCESS_TOKEN";
pub const APICAST_MANAGEMENT_API: &str = "APICAST_MANAGEMENT_API";
pub const APICAST_OPENSSL_VERIFY: &str = "APICAST_OPENSSL_VERIFY";
pub const APICAST_RESPONSE_CODES: &str = "APICAST_RESPONSE_CODES";
pub const APICAST_REGISTRY_URL: &str = "APICAST_REGISTRY_URL";

pub struct ApicastAdapter;

impl Adapter for ApicastAdapter {
    fn name(&self) -> &'static str {
        "apicast"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(APICAST_ACCESS_TOKEN)
                .with_description("Read Only Access Token that is APIcast going to use to download its configuration.")
                .generated(GENERATED_SECRET),
            Parameter::optional(APICAST_MANAGEMENT_API)
                .with_description("Scope of the APIcast Management API. Can be disabled, status or debug. At least status required for health checks.")
                .with_value("status"),
            Parameter::optional(APICAST_OPENSSL_VERIFY)
                .with_description("Turn on/off the OpenSSL peer verification when downloading the configuration. Can be set to true/false.")
                .with_value("false"),
            Parameter::optional(APICAST_RESPONSE_CODES)
                .with_description("Enable logging response codes in APIcast.")
                .with_value("true"),
            Parameter::required(APICAST_REGISTRY_URL)
                .with_description("A URL which resolves to the location of APIcast policies")
                .with_value("http://apicast-staging:8090/policies"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = ApicastOptions::builder()
            .app_label(p(APP_LABEL))
            .tenant_name(p(TENANT_NAME))
            .wildcard_domain(p(WILDCARD_DOMAIN))
            .management_api(p(APICAST_MANAGEMENT_API))
            .openssl_verify(p(APICAST_OPENSSL_VERIFY))
            .response_codes(p(APICAST_RESPONSE_CODES))
            .build()?;
        Ok(Apicast::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        apicast::capabilities()
    }
}
