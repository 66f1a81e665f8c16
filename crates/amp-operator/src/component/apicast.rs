//! The staging and production gateways of a template deployment.
//!
//! Standalone gateways managed through the `APIcast` custom resource live in
//! [`crate::apicast`].
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::{Capabilities, Component, DeploymentConfigBuilder, config_map, route, service};
use crate::{
    builder::pod::{
        PodTemplateBuilder, container::ContainerBuilder, probe::ProbeBuilder,
        resources::ResourceRequirementsBuilder,
    },
    labels::{self, Labels},
    object::ResourceObject,
    openshift::RouteSpec,
    options::define_options,
};

pub const APICAST_STAGING: &str = "apicast-staging";
pub const APICAST_PRODUCTION: &str = "apicast-production";
pub const ENVIRONMENT_CONFIG_MAP: &str = "apicast-environment";

const GATEWAY_PORT: i32 = 8080;
const MANAGEMENT_PORT: i32 = 8090;
const IMAGE: &str = "amp-apicast:latest";

define_options! {
    ApicastOptions, ApicastOptionsBuilder {
        required {
            app_label: String,
            tenant_name: String,
            wildcard_domain: String,
        }
        optional {
            management_api: String = "status",
            openssl_verify: String = "false",
            response_codes: String = "true",
            staging_replicas: i32 = 1,
            production_replicas: i32 = 1,
        }
        omittable {}
    }
}

/// Per-environment differences between the two gateways.
struct Environment {
    name: &'static str,
    deployment_env: &'static str,
    configuration_loader: &'static str,
    configuration_cache: &'static str,
}

const STAGING: Environment = Environment {
    name: APICAST_STAGING,
    deployment_env: "staging",
    configuration_loader: "lazy",
    configuration_cache: "0",
};

const PRODUCTION: Environment = Environment {
    name: APICAST_PRODUCTION,
    deployment_env: "production",
    configuration_loader: "boot",
    configuration_cache: "300",
};

pub struct Apicast {
    options: ApicastOptions,
}

impl Apicast {
    pub fn new(options: ApicastOptions) -> Self {
        Self { options }
    }

    fn labels(&self, environment: &Environment) -> Labels {
        labels::sets::element(
            self.options.app_label(),
            "apicast",
            environment.deployment_env,
        )
    }

    fn gateway(&self, environment: &Environment, replicas: i32) -> Vec<ResourceObject> {
        let container = ContainerBuilder::new(environment.name)
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .add_container_port("gateway", GATEWAY_PORT)
            .add_container_port("management", MANAGEMENT_PORT)
            .add_env_var_from_secret(
                "THREESCALE_PORTAL_ENDPOINT",
                super::system::MASTER_APICAST_SECRET,
                "PROXY_CONFIGS_ENDPOINT",
            )
            .add_env_var_from_secret(
                "BACKEND_ENDPOINT_OVERRIDE",
                super::backend::LISTENER_SECRET,
                super::backend::LISTENER_SERVICE_ENDPOINT_FIELD,
            )
            .add_env_var("APICAST_CONFIGURATION_LOADER", environment.configuration_loader)
            .add_env_var("APICAST_CONFIGURATION_CACHE", environment.configuration_cache)
            .add_env_var("THREESCALE_DEPLOYMENT_ENV", environment.deployment_env)
            .add_env_var_from_config_map(
                "APICAST_MANAGEMENT_API",
                ENVIRONMENT_CONFIG_MAP,
                "APICAST_MANAGEMENT_API",
            )
            .add_env_var_from_config_map(
                "OPENSSL_VERIFY",
                ENVIRONMENT_CONFIG_MAP,
                "OPENSSL_VERIFY",
            )
            .add_env_var_from_config_map(
                "APICAST_RESPONSE_CODES",
                ENVIRONMENT_CONFIG_MAP,
                "APICAST_RESPONSE_CODES",
            )
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("100m")
                    .with_memory_limit("128Mi")
                    .with_cpu_request("50m")
                    .with_memory_request("64Mi")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::http_get(IntOrString::Int(MANAGEMENT_PORT), "/status/live")
                    .initial_delay_seconds(10)
                    .period_seconds(10)
                    .timeout_seconds(5)
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::http_get(IntOrString::Int(MANAGEMENT_PORT), "/status/ready")
                    .initial_delay_seconds(15)
                    .period_seconds(30)
                    .timeout_seconds(5)
                    .build(),
            )
            .build();

        let template = PodTemplateBuilder::new()
            .add_container(container)
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        let labels = self.labels(environment);
        let host = format!(
            "api-{}-{}.{}",
            self.options.tenant_name(),
            environment.name,
            self.options.wildcard_domain()
        );

        vec![
            DeploymentConfigBuilder::new(environment.name, labels.clone())
                .replicas(replicas)
                .image_change_trigger(&[environment.name], IMAGE)
                .build(template),
            service(
                environment.name,
                labels.clone(),
                environment.name,
                &[
                    ("gateway", GATEWAY_PORT, "gateway"),
                    ("management", MANAGEMENT_PORT, "management"),
                ],
            ),
            route(
                &format!("api-{}", environment.name),
                labels,
                RouteSpec::edge(host, environment.name, "gateway"),
            ),
        ]
    }
}

impl Component for Apicast {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        let mut objects = self.gateway(&STAGING, *options.staging_replicas());
        objects.extend(self.gateway(&PRODUCTION, *options.production_replicas()));
        objects.push(config_map(
            ENVIRONMENT_CONFIG_MAP,
            labels::sets::component(options.app_label(), "apicast"),
            [
                ("APICAST_MANAGEMENT_API", options.management_api().clone()),
                ("OPENSSL_VERIFY", options.openssl_verify().clone()),
                ("APICAST_RESPONSE_CODES", options.response_codes().clone()),
            ],
        ));
        objects
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities::default()
}
