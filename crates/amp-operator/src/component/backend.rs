use k8s_openapi::{api::core::v1::Container, apimachinery::pkg::util::intstr::IntOrString};

use super::{
    Capabilities, Component, DeploymentConfigBuilder, ExternalEndpoint, route, secret, service,
};
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

pub const BACKEND_CRON: &str = "backend-cron";
pub const BACKEND_LISTENER: &str = "backend-listener";
pub const BACKEND_WORKER: &str = "backend-worker";
pub const BACKEND_ROUTE: &str = "backend";

pub const INTERNAL_API_SECRET: &str = "backend-internal-api";
pub const LISTENER_SECRET: &str = "backend-listener";
pub const REDIS_SECRET: &str = "backend-redis";

pub const REDIS_STORAGE_URL_FIELD: &str = "REDIS_STORAGE_URL";
pub const REDIS_QUEUES_URL_FIELD: &str = "REDIS_QUEUES_URL";
pub const LISTENER_SERVICE_ENDPOINT_FIELD: &str = "service_endpoint";
pub const LISTENER_ROUTE_ENDPOINT_FIELD: &str = "route_endpoint";

const LISTENER_PORT: i32 = 3000;
const IMAGE: &str = "amp-backend:latest";

define_options! {
    /// Credentials, routing and scale of the backend.
    BackendOptions, BackendOptionsBuilder {
        required {
            app_label: String,
            system_backend_username: String,
            system_backend_password: String,
            tenant_name: String,
            wildcard_domain: String,
        }
        optional {
            storage_url: String = "redis://backend-redis:6379/0",
            queues_url: String = "redis://backend-redis:6379/1",
            listener_replicas: i32 = 1,
            worker_replicas: i32 = 1,
            cron_replicas: i32 = 1,
        }
        omittable {}
    }
}

pub struct Backend {
    options: BackendOptions,
}

impl Backend {
    pub fn new(options: BackendOptions) -> Self {
        Self { options }
    }

    fn labels(&self, element: &str) -> Labels {
        labels::sets::element(self.options.app_label(), "backend", element)
    }

    fn route_host(&self) -> String {
        format!(
            "backend-{}.{}",
            self.options.tenant_name(),
            self.options.wildcard_domain()
        )
    }

    /// Adds the Redis connection every backend process needs.
    fn with_redis_env(container: &mut ContainerBuilder) -> &mut ContainerBuilder {
        container
            .add_env_var_from_secret("CONFIG_REDIS_PROXY", REDIS_SECRET, REDIS_STORAGE_URL_FIELD)
            .add_env_var_from_secret(
                "CONFIG_QUEUES_MASTER_NAME",
                REDIS_SECRET,
                REDIS_QUEUES_URL_FIELD,
            )
            .add_env_var("CONFIG_REDIS_SENTINEL_HOSTS", "")
            .add_env_var("CONFIG_REDIS_SENTINEL_ROLE", "")
            .add_env_var("CONFIG_QUEUES_SENTINEL_HOSTS", "")
            .add_env_var("CONFIG_QUEUES_SENTINEL_ROLE", "")
            .add_env_var("RACK_ENV", "production")
    }

    fn pod(container: Container) -> k8s_openapi::api::core::v1::PodTemplateSpec {
        PodTemplateBuilder::new()
            .add_container(container)
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build()
    }

    fn cron(&self) -> ResourceObject {
        let mut container = ContainerBuilder::new(BACKEND_CRON);
        container
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .args(["backend-cron"]);
        Self::with_redis_env(&mut container).resources(
            ResourceRequirementsBuilder::new()
                .with_cpu_limit("150m")
                .with_memory_limit("80Mi")
                .with_cpu_request("50m")
                .with_memory_request("40Mi")
                .build(),
        );

        DeploymentConfigBuilder::new(BACKEND_CRON, self.labels("cron"))
            .replicas(*self.options.cron_replicas())
            .image_change_trigger(&[BACKEND_CRON], IMAGE)
            .build(Self::pod(container.build()))
    }

    fn listener(&self) -> ResourceObject {
        let mut container = ContainerBuilder::new(BACKEND_LISTENER);
        container
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .args([
                "bin/3scale_backend",
                "start",
                "-e",
                "production",
                "-p",
                "3000",
                "-x",
                "/dev/stdout",
            ])
            .add_container_port("http", LISTENER_PORT);
        Self::with_redis_env(&mut container)
            .add_env_var("PUMA_WORKERS", "16")
            .add_env_var_from_secret("CONFIG_INTERNAL_API_USER", INTERNAL_API_SECRET, "username")
            .add_env_var_from_secret(
                "CONFIG_INTERNAL_API_PASSWORD",
                INTERNAL_API_SECRET,
                "password",
            )
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("1000m")
                    .with_memory_limit("700Mi")
                    .with_cpu_request("500m")
                    .with_memory_request("550Mi")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::Int(LISTENER_PORT))
                    .initial_delay_seconds(30)
                    .period_seconds(10)
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::http_get(IntOrString::Int(LISTENER_PORT), "/status")
                    .initial_delay_seconds(30)
                    .timeout_seconds(5)
                    .build(),
            );

        DeploymentConfigBuilder::new(BACKEND_LISTENER, self.labels("listener"))
            .replicas(*self.options.listener_replicas())
            .image_change_trigger(&[BACKEND_LISTENER], IMAGE)
            .build(Self::pod(container.build()))
    }

    fn worker(&self) -> ResourceObject {
        let mut container = ContainerBuilder::new(BACKEND_WORKER);
        container
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .args(["bin/3scale_backend_worker", "run"]);
        Self::with_redis_env(&mut container)
            .add_env_var_from_secret(
                "CONFIG_EVENTS_HOOK",
                super::system::EVENTS_HOOK_SECRET,
                "URL",
            )
            .add_env_var_from_secret(
                "CONFIG_EVENTS_HOOK_SHARED_SECRET",
                super::system::EVENTS_HOOK_SECRET,
                "PASSWORD",
            )
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("1000m")
                    .with_memory_limit("300Mi")
                    .with_cpu_request("150m")
                    .with_memory_request("50Mi")
                    .build(),
            );

        DeploymentConfigBuilder::new(BACKEND_WORKER, self.labels("worker"))
            .replicas(*self.options.worker_replicas())
            .image_change_trigger(&[BACKEND_WORKER], IMAGE)
            .build(Self::pod(container.build()))
    }
}

impl Component for Backend {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        vec![
            self.cron(),
            self.listener(),
            service(
                BACKEND_LISTENER,
                self.labels("listener"),
                BACKEND_LISTENER,
                &[("http", LISTENER_PORT, "http")],
            ),
            self.worker(),
            route(
                BACKEND_ROUTE,
                self.labels("listener"),
                RouteSpec::edge(self.route_host(), BACKEND_LISTENER, "http"),
            ),
            secret(
                INTERNAL_API_SECRET,
                labels::sets::component(options.app_label(), "backend"),
                [
                    ("username", options.system_backend_username().clone()),
                    ("password", options.system_backend_password().clone()),
                ],
            ),
            secret(
                LISTENER_SECRET,
                labels::sets::component(options.app_label(), "backend"),
                [
                    (
                        LISTENER_SERVICE_ENDPOINT_FIELD,
                        format!("http://{BACKEND_LISTENER}:{LISTENER_PORT}"),
                    ),
                    (
                        LISTENER_ROUTE_ENDPOINT_FIELD,
                        format!("https://{}", self.route_host()),
                    ),
                ],
            ),
            secret(
                REDIS_SECRET,
                labels::sets::component(options.app_label(), "backend"),
                [
                    (REDIS_STORAGE_URL_FIELD, options.storage_url().clone()),
                    (REDIS_QUEUES_URL_FIELD, options.queues_url().clone()),
                ],
            ),
        ]
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities::default()
        .with_endpoint(
            ExternalEndpoint::BackendRedisStorage,
            REDIS_SECRET,
            REDIS_STORAGE_URL_FIELD,
        )
        .with_endpoint(
            ExternalEndpoint::BackendRedisQueues,
            REDIS_SECRET,
            REDIS_QUEUES_URL_FIELD,
        )
}
