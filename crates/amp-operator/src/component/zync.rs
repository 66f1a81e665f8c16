use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::{Capabilities, Component, DeploymentConfigBuilder, secret, service};
use crate::{
    builder::pod::{
        PodTemplateBuilder, container::ContainerBuilder, probe::ProbeBuilder,
        resources::ResourceRequirementsBuilder, volume,
    },
    labels::{self, Labels},
    object::ResourceObject,
    openshift::deployment_config::DeploymentStrategy,
    options::define_options,
};

pub const ZYNC: &str = "zync";
pub const ZYNC_DATABASE: &str = "zync-database";

pub const SECRET: &str = "zync";
pub const AUTHENTICATION_TOKEN_FIELD: &str = "ZYNC_AUTHENTICATION_TOKEN";

const ZYNC_PORT: i32 = 8080;
const DATABASE_PORT: i32 = 5432;

define_options! {
    ZyncOptions, ZyncOptionsBuilder {
        required {
            app_label: String,
            authentication_token: String,
            database_password: String,
            secret_key_base: String,
        }
        optional { replicas: i32 = 1 }
        omittable {}
    }
}

pub struct Zync {
    options: ZyncOptions,
}

impl Zync {
    pub fn new(options: ZyncOptions) -> Self {
        Self { options }
    }

    fn labels(&self, element: &str) -> Labels {
        labels::sets::element(self.options.app_label(), "zync", element)
    }

    fn zync(&self) -> ResourceObject {
        let container = ContainerBuilder::new(ZYNC)
            .image("amp-zync:latest")
            .image_pull_policy("IfNotPresent")
            .add_container_port("http", ZYNC_PORT)
            .add_env_var("RAILS_LOG_TO_STDOUT", "true")
            .add_env_var("RAILS_ENV", "production")
            .add_env_var_from_secret("DATABASE_URL", SECRET, "DATABASE_URL")
            .add_env_var_from_secret("SECRET_KEY_BASE", SECRET, "SECRET_KEY_BASE")
            .add_env_var_from_secret(
                "ZYNC_AUTHENTICATION_TOKEN",
                SECRET,
                AUTHENTICATION_TOKEN_FIELD,
            )
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("1")
                    .with_memory_limit("512Mi")
                    .with_cpu_request("150m")
                    .with_memory_request("250M")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::http_get(IntOrString::Int(ZYNC_PORT), "/status/live")
                    .initial_delay_seconds(10)
                    .period_seconds(10)
                    .timeout_seconds(60)
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::http_get(IntOrString::Int(ZYNC_PORT), "/status/ready")
                    .initial_delay_seconds(30)
                    .period_seconds(10)
                    .timeout_seconds(10)
                    .build(),
            )
            .build();

        let template = PodTemplateBuilder::new()
            .add_container(container)
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        DeploymentConfigBuilder::new(ZYNC, self.labels("zync"))
            .replicas(*self.options.replicas())
            .image_change_trigger(&[ZYNC], "amp-zync:latest")
            .build(template)
    }

    fn database(&self) -> ResourceObject {
        let container = ContainerBuilder::new("postgresql")
            .image("postgresql:latest")
            .image_pull_policy("IfNotPresent")
            .add_container_port("postgresql", DATABASE_PORT)
            .add_env_var("POSTGRESQL_USER", "zync")
            .add_env_var_from_secret("POSTGRESQL_PASSWORD", SECRET, "ZYNC_DATABASE_PASSWORD")
            .add_env_var("POSTGRESQL_DATABASE", "zync_production")
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("250m")
                    .with_memory_limit("2G")
                    .with_cpu_request("50m")
                    .with_memory_request("250M")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::Int(DATABASE_PORT))
                    .initial_delay_seconds(30)
                    .timeout_seconds(1)
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::exec([
                    "/bin/sh",
                    "-c",
                    "psql -h 127.0.0.1 -U zync -q -d zync_production -c 'SELECT 1'",
                ])
                .initial_delay_seconds(5)
                .timeout_seconds(1)
                .build(),
            )
            .add_volume_mount("zync-database-data", "/var/lib/pgsql/data")
            .build();

        let template = PodTemplateBuilder::new()
            .add_container(container)
            .add_volume(volume::empty_dir("zync-database-data"))
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        DeploymentConfigBuilder::new(ZYNC_DATABASE, self.labels("database"))
            .strategy(DeploymentStrategy::recreate())
            .image_change_trigger(&["postgresql"], "postgresql:latest")
            .build(template)
    }
}

impl Component for Zync {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        vec![
            secret(
                SECRET,
                labels::sets::component(options.app_label(), "zync"),
                [
                    (
                        "DATABASE_URL",
                        format!(
                            "postgresql://zync:{}@{ZYNC_DATABASE}:{DATABASE_PORT}/zync_production",
                            options.database_password()
                        ),
                    ),
                    ("ZYNC_DATABASE_PASSWORD", options.database_password().clone()),
                    ("SECRET_KEY_BASE", options.secret_key_base().clone()),
                    (
                        AUTHENTICATION_TOKEN_FIELD,
                        options.authentication_token().clone(),
                    ),
                ],
            ),
            self.zync(),
            self.database(),
            service(ZYNC, self.labels("zync"), ZYNC, &[("http", ZYNC_PORT, "http")]),
            service(
                ZYNC_DATABASE,
                self.labels("database"),
                ZYNC_DATABASE,
                &[("postgresql", DATABASE_PORT, "postgresql")],
            ),
        ]
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        singleton_workloads: [ZYNC_DATABASE.to_owned()].into(),
        ..Capabilities::default()
    }
}
