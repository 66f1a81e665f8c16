use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::{Capabilities, Component, DeploymentConfigBuilder, route, service};
use crate::{
    builder::pod::{
        PodTemplateBuilder, container::ContainerBuilder, probe::ProbeBuilder,
        resources::ResourceRequirementsBuilder,
    },
    labels,
    object::ResourceObject,
    openshift::RouteSpec,
    options::define_options,
};

pub const WILDCARD_ROUTER: &str = "apicast-wildcard-router";

const HTTP_PORT: i32 = 8080;
const IMAGE: &str = "amp-wildcard-router:latest";

define_options! {
    WildcardRouterOptions, WildcardRouterOptionsBuilder {
        required {
            app_label: String,
            wildcard_domain: String,
        }
        optional { wildcard_policy: String = "None" }
        omittable {}
    }
}

/// Routes every `*.<wildcard domain>` host to the gateway of the matching tenant.
pub struct WildcardRouter {
    options: WildcardRouterOptions,
}

impl WildcardRouter {
    pub fn new(options: WildcardRouterOptions) -> Self {
        Self { options }
    }
}

impl Component for WildcardRouter {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        let labels = labels::sets::element(options.app_label(), "apicast", "wildcard-router");

        let container = ContainerBuilder::new(WILDCARD_ROUTER)
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .add_container_port("http", HTTP_PORT)
            .add_env_var_from_secret("API_HOST", super::system::MASTER_APICAST_SECRET, "BASE_URL")
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("500m")
                    .with_memory_limit("64Mi")
                    .with_cpu_request("120m")
                    .with_memory_request("32Mi")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::String("http".to_owned()))
                    .initial_delay_seconds(30)
                    .period_seconds(10)
                    .build(),
            )
            .build();

        let template = PodTemplateBuilder::new()
            .add_container(container)
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        let mut route_spec = RouteSpec::edge(
            format!("apicast-wildcard.{}", options.wildcard_domain()),
            WILDCARD_ROUTER,
            "http",
        );
        route_spec.wildcard_policy = Some(options.wildcard_policy().clone());

        vec![
            DeploymentConfigBuilder::new(WILDCARD_ROUTER, labels.clone())
                .image_change_trigger(&[WILDCARD_ROUTER], IMAGE)
                .build(template),
            service(
                WILDCARD_ROUTER,
                labels.clone(),
                WILDCARD_ROUTER,
                &[("http", HTTP_PORT, "http")],
            ),
            route(WILDCARD_ROUTER, labels, route_spec),
        ]
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities::default()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::component::test_support::{assert_labelled, assert_services_select_workloads};

    #[rstest]
    #[case(None, "None")]
    #[case(Some("Subdomain"), "Subdomain")]
    fn route_carries_wildcard_policy(#[case] policy: Option<&str>, #[case] expected: &str) {
        let mut builder = WildcardRouterOptions::builder();
        builder
            .app_label("3scale-api-management")
            .wildcard_domain("apps.example.com");
        if let Some(policy) = policy {
            builder.wildcard_policy(policy);
        }
        let objects =
            WildcardRouter::new(builder.build().expect("all required fields are set")).objects();
        assert_labelled(&objects);
        assert_services_select_workloads(&objects);

        let ResourceObject::Route(route) = &objects[2] else {
            unreachable!("the route comes last");
        };
        assert_eq!(
            route.spec.host.as_deref(),
            Some("apicast-wildcard.apps.example.com")
        );
        assert_eq!(route.spec.wildcard_policy.as_deref(), Some(expected));
    }
}
