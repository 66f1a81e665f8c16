use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::{Capabilities, Component, DeploymentConfigBuilder, service};
use crate::{
    builder::pod::{
        PodTemplateBuilder, container::ContainerBuilder, probe::ProbeBuilder,
        resources::ResourceRequirementsBuilder,
    },
    labels,
    object::ResourceObject,
    options::define_options,
};

pub const SYSTEM_MEMCACHE: &str = "system-memcache";

const MEMCACHE_PORT: i32 = 11211;

define_options! {
    MemcachedOptions, MemcachedOptionsBuilder {
        required { app_label: String }
        optional { image: String = "system-memcached:latest" }
        omittable {}
    }
}

pub struct Memcached {
    options: MemcachedOptions,
}

impl Memcached {
    pub fn new(options: MemcachedOptions) -> Self {
        Self { options }
    }
}

impl Component for Memcached {
    fn objects(&self) -> Vec<ResourceObject> {
        let labels = labels::sets::element(self.options.app_label(), "system", "memcache");

        let container = ContainerBuilder::new("memcache")
            .image(self.options.image())
            .image_pull_policy("IfNotPresent")
            .command(["memcached", "-m", "64"])
            .add_container_port("memcache", MEMCACHE_PORT)
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("250m")
                    .with_memory_limit("96Mi")
                    .with_cpu_request("50m")
                    .with_memory_request("64Mi")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::Int(MEMCACHE_PORT))
                    .initial_delay_seconds(10)
                    .period_seconds(10)
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::exec(["sh", "-c", "echo version | nc $HOSTNAME 11211 | grep VERSION"])
                    .initial_delay_seconds(10)
                    .period_seconds(30)
                    .timeout_seconds(5)
                    .build(),
            )
            .build();

        let template = PodTemplateBuilder::new()
            .add_container(container)
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        vec![
            DeploymentConfigBuilder::new(SYSTEM_MEMCACHE, labels.clone())
                .image_change_trigger(&["memcache"], "system-memcached:latest")
                .build(template),
            service(
                SYSTEM_MEMCACHE,
                labels,
                SYSTEM_MEMCACHE,
                &[("memcache", MEMCACHE_PORT, "memcache")],
            ),
        ]
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        singleton_workloads: [SYSTEM_MEMCACHE.to_owned()].into(),
        ..Capabilities::default()
    }
}
