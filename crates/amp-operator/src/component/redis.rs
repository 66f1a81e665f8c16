use indoc::indoc;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::{
    Capabilities, Component, DeploymentConfigBuilder, config_map, persistent_volume_claim, service,
};
use crate::{
    builder::pod::{
        PodTemplateBuilder, container::ContainerBuilder, probe::ProbeBuilder,
        resources::ResourceRequirementsBuilder, volume,
    },
    labels,
    object::{ObjectKind, ResourceObject},
    openshift::deployment_config::DeploymentStrategy,
    options::define_options,
};

pub const BACKEND_REDIS: &str = "backend-redis";
pub const BACKEND_REDIS_STORAGE: &str = "backend-redis-storage";
pub const SYSTEM_REDIS: &str = "system-redis";
pub const SYSTEM_REDIS_STORAGE: &str = "system-redis-storage";
pub const REDIS_CONFIG: &str = "redis-config";

const REDIS_PORT: i32 = 6379;

const REDIS_CONF: &str = indoc! {"
    protected-mode no

    port 6379

    timeout 0
    tcp-keepalive 300

    daemonize no
    supervised no

    loglevel notice

    databases 16

    save 900 1
    save 300 10
    save 60 10000

    stop-writes-on-bgsave-error yes

    rdbcompression yes
    rdbchecksum yes

    dbfilename dump.rdb

    slave-serve-stale-data yes
    slave-read-only yes

    repl-diskless-sync no
    repl-disable-tcp-nodelay no

    appendonly yes
    appendfilename \"appendonly.aof\"
    appendfsync everysec
    no-appendfsync-on-rewrite no
    auto-aof-rewrite-percentage 100
    auto-aof-rewrite-min-size 64mb
    aof-load-truncated yes

    lua-time-limit 5000

    activerehashing no

    aof-rewrite-incremental-fsync yes
    dir /var/lib/redis/data
"};

define_options! {
    /// Storage of the backend and system Redis instances.
    RedisOptions, RedisOptionsBuilder {
        required { app_label: String }
        optional {}
        omittable {
            backend_redis_storage_class: String,
            system_redis_storage_class: String,
        }
    }
}

pub struct Redis {
    options: RedisOptions,
}

impl Redis {
    pub fn new(options: RedisOptions) -> Self {
        Self { options }
    }

    /// Workload, Service and PVC of one Redis instance.
    fn instance(
        &self,
        name: &str,
        storage: &str,
        storage_class: Option<&String>,
    ) -> Vec<ResourceObject> {
        let labels = labels::sets::element(self.options.app_label(), "redis", name);
        let data_volume = format!("{name}-storage");

        let container = ContainerBuilder::new(name)
            .image(format!("{name}:latest"))
            .image_pull_policy("IfNotPresent")
            .command(["/opt/rh/rh-redis32/root/usr/bin/redis-server"])
            .args(["/etc/redis.d/redis.conf", "--daemonize", "no"])
            .add_container_port("redis", REDIS_PORT)
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("2000m")
                    .with_memory_limit("32Gi")
                    .with_cpu_request("1000m")
                    .with_memory_request("1024Mi")
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::exec([
                    "container-entrypoint",
                    "bash",
                    "-c",
                    "redis-cli set liveness-probe \"`date`\" | grep OK",
                ])
                .initial_delay_seconds(10)
                .period_seconds(30)
                .timeout_seconds(1)
                .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::Int(REDIS_PORT))
                    .initial_delay_seconds(10)
                    .period_seconds(10)
                    .build(),
            )
            .add_volume_mount(&data_volume, "/var/lib/redis/data")
            .add_volume_mount(REDIS_CONFIG, "/etc/redis.d/")
            .build();

        let template = PodTemplateBuilder::new()
            .add_container(container)
            .add_volume(volume::persistent_volume_claim(&data_volume, storage))
            .add_volume(volume::config_map(REDIS_CONFIG, REDIS_CONFIG, ["redis.conf"]))
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        vec![
            DeploymentConfigBuilder::new(name, labels.clone())
                .strategy(DeploymentStrategy::recreate())
                .image_change_trigger(&[name], &format!("{name}:latest"))
                .build(template),
            service(name, labels.clone(), name, &[("redis", REDIS_PORT, "redis")]),
            persistent_volume_claim(storage, labels, "ReadWriteOnce", "1Gi", storage_class),
        ]
    }
}

impl Component for Redis {
    fn objects(&self) -> Vec<ResourceObject> {
        let mut objects = self.instance(
            BACKEND_REDIS,
            BACKEND_REDIS_STORAGE,
            self.options.backend_redis_storage_class(),
        );
        objects.push(config_map(
            REDIS_CONFIG,
            labels::sets::component(self.options.app_label(), "redis"),
            [("redis.conf", REDIS_CONF.to_owned())],
        ));
        objects.extend(self.instance(
            SYSTEM_REDIS,
            SYSTEM_REDIS_STORAGE,
            self.options.system_redis_storage_class(),
        ));
        objects
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities::default()
        .with_external_database_objects(ObjectKind::DeploymentConfig, [BACKEND_REDIS, SYSTEM_REDIS])
        .with_external_database_objects(ObjectKind::Service, [BACKEND_REDIS, SYSTEM_REDIS])
        .with_external_database_objects(ObjectKind::ConfigMap, [REDIS_CONFIG])
        .with_external_database_objects(
            ObjectKind::PersistentVolumeClaim,
            [BACKEND_REDIS_STORAGE, SYSTEM_REDIS_STORAGE],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::test_support::{assert_labelled, assert_services_select_workloads};

    #[test]
    fn objects_are_labelled_and_selectable() {
        let options = RedisOptions::builder()
            .app_label("3scale-api-management")
            .build()
            .expect("all required fields are set");
        let objects = Redis::new(options).objects();

        let names: Vec<_> = objects.iter().map(|object| object.key().to_string()).collect();
        assert_eq!(
            names,
            [
                "DeploymentConfig/backend-redis",
                "Service/backend-redis",
                "PersistentVolumeClaim/backend-redis-storage",
                "ConfigMap/redis-config",
                "DeploymentConfig/system-redis",
                "Service/system-redis",
                "PersistentVolumeClaim/system-redis-storage",
            ]
        );
        assert_labelled(&objects);
        assert_services_select_workloads(&objects);
    }

    #[test]
    fn every_owned_object_is_externally_replaceable() {
        let options = RedisOptions::builder()
            .app_label("amp")
            .build()
            .expect("all required fields are set");
        let declared = capabilities().external_database_objects;

        for object in Redis::new(options).objects() {
            assert!(declared.contains(&object.key()), "{} is not declared", object.key());
        }
    }
}
