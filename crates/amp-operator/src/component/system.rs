use indoc::indoc;
use k8s_openapi::{
    api::core::v1::{EnvVar, PodTemplateSpec},
    apimachinery::pkg::util::intstr::IntOrString,
};

use super::{
    Capabilities, Component, DeploymentConfigBuilder, ExternalEndpoint, SharedStorage, config_map,
    persistent_volume_claim, route, secret, service,
};
use crate::{
    builder::pod::{
        PodTemplateBuilder,
        container::ContainerBuilder,
        env::{env_var, env_var_from_config_map, env_var_from_secret},
        probe::ProbeBuilder,
        resources::ResourceRequirementsBuilder,
        volume,
    },
    labels::{self, Labels},
    object::ResourceObject,
    openshift::{
        RouteSpec,
        deployment_config::{DeploymentStrategy, ExecNewPodHook, LifecycleHook},
    },
    options::define_options,
};

pub const SYSTEM_APP: &str = "system-app";
pub const SYSTEM_SIDEKIQ: &str = "system-sidekiq";
pub const SYSTEM_SPHINX: &str = "system-sphinx";

pub const SYSTEM_PROVIDER: &str = "system-provider";
pub const SYSTEM_MASTER: &str = "system-master";
pub const SYSTEM_DEVELOPER: &str = "system-developer";

pub const ENVIRONMENT_CONFIG_MAP: &str = "system-environment";
pub const CONFIG_MAP: &str = "system";
pub const STORAGE: &str = "system-storage";

pub const SEED_SECRET: &str = "system-seed";
pub const MASTER_APICAST_SECRET: &str = "system-master-apicast";
pub const APP_SECRET: &str = "system-app";
pub const EVENTS_HOOK_SECRET: &str = "system-events-hook";
pub const RECAPTCHA_SECRET: &str = "system-recaptcha";
pub const REDIS_SECRET: &str = "system-redis";
pub const REDIS_URL_FIELD: &str = "URL";

const CONFIG_VOLUME: &str = "system-config";
const STORAGE_MOUNT_PATH: &str = "/opt/system/public/system";
const CONFIG_MOUNT_PATH: &str = "/opt/system-extra-configs";
const IMAGE: &str = "amp-system:latest";
const CONFIG_FILES: [&str; 3] = ["zync.yml", "rolling_updates.yml", "service_discovery.yml"];

/// Keys of [`ENVIRONMENT_CONFIG_MAP`], exposed verbatim to every system process.
const ENVIRONMENT_KEYS: [&str; 11] = [
    "AMP_RELEASE",
    "APICAST_REGISTRY_URL",
    "FORCE_SSL",
    "PROVIDER_PLAN",
    "RAILS_ENV",
    "RAILS_LOG_LEVEL",
    "RAILS_LOG_TO_STDOUT",
    "SSL_CERT_DIR",
    "THINKING_SPHINX_PORT",
    "THREESCALE_SANDBOX_PROXY_OPENSSL_VERIFY_MODE",
    "THREESCALE_SUPERDOMAIN",
];

const ZYNC_CONFIG: &str = indoc! {"
    production:
      endpoint: 'http://zync:8080'
      authentication:
        token: \"<%= ENV.fetch('ZYNC_AUTHENTICATION_TOKEN') %>\"
      connect_timeout: 5
      send_timeout: 5
      receive_timeout: 10
      root_url:
"};

const ROLLING_UPDATES_CONFIG: &str = indoc! {"
    production:
      old_charts: false
      new_provider_documentation: false
      proxy_pro: false
      instant_bill_plan_change: false
      service_permissions: true
      async_apicast_deploy: false
      duplicate_application_id: true
      duplicate_user_key: true
      plan_changes_wizard: false
      require_cc_on_signup: false
      apicast_per_service: true
      policies: true
      policy_registry: true
      proxy_private_base_path: true
"};

const SERVICE_DISCOVERY_CONFIG: &str = indoc! {"
    production:
      enabled: <%= cluster_token_file_exists = File.exist?(cluster_token_file_path = '/var/run/secrets/kubernetes.io/serviceaccount/token') %>
      server_scheme: 'https'
      server_host: 'kubernetes.default.svc.cluster.local'
      server_port: 443
      authentication_method: service_account
      oauth_server_type: builtin
      client_id:
      client_secret:
      timeout: 1
      open_timeout: 1
      max_retry: 5
      verify_ssl: <%= OpenSSL::SSL::VERIFY_NONE %>
      bearer_token: \"<%= File.read(cluster_token_file_path) if cluster_token_file_exists %>\"
"};

define_options! {
    /// Tenants, credentials and scale of the system (admin portal) component.
    SystemOptions, SystemOptionsBuilder {
        required {
            app_label: String,
            amp_release: String,
            admin_password: String,
            admin_username: String,
            admin_access_token: String,
            master_name: String,
            master_username: String,
            master_password: String,
            master_access_token: String,
            app_secret_key_base: String,
            backend_shared_secret: String,
            tenant_name: String,
            wildcard_domain: String,
            apicast_access_token: String,
            apicast_registry_url: String,
        }
        optional {
            admin_email: String = "",
            recaptcha_public_key: String = "",
            recaptcha_private_key: String = "",
            redis_url: String = "redis://system-redis:6379/1",
            app_replicas: i32 = 1,
            sidekiq_replicas: i32 = 1,
        }
        omittable { storage_class_name: String }
    }
}

pub struct System {
    options: SystemOptions,
}

impl System {
    pub fn new(options: SystemOptions) -> Self {
        Self { options }
    }

    fn labels(&self) -> Labels {
        labels::sets::component(self.options.app_label(), "system")
    }

    fn element_labels(&self, element: &str) -> Labels {
        labels::sets::element(self.options.app_label(), "system", element)
    }

    /// Environment shared by the system processes and the pre-deployment hook.
    fn base_env() -> Vec<EnvVar> {
        let mut env: Vec<EnvVar> = ENVIRONMENT_KEYS
            .iter()
            .map(|key| env_var_from_config_map(*key, ENVIRONMENT_CONFIG_MAP, *key))
            .collect();

        env.extend([
            env_var("THINKING_SPHINX_ADDRESS", SYSTEM_SPHINX),
            env_var("THINKING_SPHINX_CONFIGURATION_FILE", "db/sphinx/production.conf"),
            env_var("MEMCACHE_SERVERS", "system-memcache:11211"),
            env_var_from_secret(
                "DATABASE_URL",
                super::mysql::DATABASE_SECRET,
                super::mysql::DATABASE_URL_FIELD,
            ),
            env_var_from_secret("MASTER_DOMAIN", SEED_SECRET, "MASTER_DOMAIN"),
            env_var_from_secret("MASTER_USER", SEED_SECRET, "MASTER_USER"),
            env_var_from_secret("MASTER_PASSWORD", SEED_SECRET, "MASTER_PASSWORD"),
            env_var_from_secret("ADMIN_ACCESS_TOKEN", SEED_SECRET, "ADMIN_ACCESS_TOKEN"),
            env_var_from_secret("USER_LOGIN", SEED_SECRET, "ADMIN_USER"),
            env_var_from_secret("USER_PASSWORD", SEED_SECRET, "ADMIN_PASSWORD"),
            env_var_from_secret("USER_EMAIL", SEED_SECRET, "ADMIN_EMAIL"),
            env_var_from_secret("TENANT_NAME", SEED_SECRET, "TENANT_NAME"),
            env_var_from_secret("RECAPTCHA_PUBLIC_KEY", RECAPTCHA_SECRET, "PUBLIC_KEY"),
            env_var_from_secret("RECAPTCHA_PRIVATE_KEY", RECAPTCHA_SECRET, "PRIVATE_KEY"),
            env_var_from_secret("SECRET_KEY_BASE", APP_SECRET, "SECRET_KEY_BASE"),
            env_var_from_secret("REDIS_URL", REDIS_SECRET, REDIS_URL_FIELD),
            env_var_from_secret(
                "BACKEND_REDIS_URL",
                super::backend::REDIS_SECRET,
                super::backend::REDIS_STORAGE_URL_FIELD,
            ),
            env_var_from_secret(
                "BACKEND_ROUTE",
                super::backend::LISTENER_SECRET,
                super::backend::LISTENER_ROUTE_ENDPOINT_FIELD,
            ),
            env_var_from_secret("APICAST_ACCESS_TOKEN", MASTER_APICAST_SECRET, "ACCESS_TOKEN"),
            env_var_from_secret("EVENTS_SHARED_SECRET", EVENTS_HOOK_SECRET, "PASSWORD"),
            env_var_from_secret(
                "ZYNC_AUTHENTICATION_TOKEN",
                super::zync::SECRET,
                super::zync::AUTHENTICATION_TOKEN_FIELD,
            ),
            env_var_from_secret(
                "CONFIG_INTERNAL_API_USER",
                super::backend::INTERNAL_API_SECRET,
                "username",
            ),
            env_var_from_secret(
                "CONFIG_INTERNAL_API_PASSWORD",
                super::backend::INTERNAL_API_SECRET,
                "password",
            ),
        ]);
        env
    }

    fn portal_container(name: &str, port_name: &str, port: i32) -> ContainerBuilder {
        let tenant_mode = format!("TENANT_MODE={port_name}");
        let listen_port = format!("PORT={port}");
        let mut container = ContainerBuilder::new(name);
        container
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .args([
                "env",
                tenant_mode.as_str(),
                listen_port.as_str(),
                "container-entrypoint",
                "bundle",
                "exec",
                "unicorn",
                "-c",
                "config/unicorn.rb",
            ])
            .add_env_vars(Self::base_env())
            .add_container_port(port_name, port)
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("1000m")
                    .with_memory_limit("800Mi")
                    .with_cpu_request("50m")
                    .with_memory_request("600Mi")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::String(port_name.to_owned()))
                    .initial_delay_seconds(10)
                    .period_seconds(10)
                    .timeout_seconds(10)
                    .build(),
            )
            .readiness_probe(
                ProbeBuilder::http_get(IntOrString::String(port_name.to_owned()), "/check.txt")
                    .initial_delay_seconds(30)
                    .period_seconds(30)
                    .timeout_seconds(10)
                    .build(),
            )
            .add_volume_mount(STORAGE, STORAGE_MOUNT_PATH)
            .add_volume_mount(CONFIG_VOLUME, CONFIG_MOUNT_PATH);
        container
    }

    fn storage_and_config(template: &mut PodTemplateBuilder) -> &mut PodTemplateBuilder {
        template
            .add_volume(volume::persistent_volume_claim(STORAGE, STORAGE))
            .add_volume(volume::config_map(CONFIG_VOLUME, CONFIG_MAP, CONFIG_FILES))
            .service_account_name(super::images::SERVICE_ACCOUNT)
    }

    fn app(&self) -> ResourceObject {
        let mut hook_env = Self::base_env();
        hook_env.push(env_var_from_secret(
            "MASTER_ACCESS_TOKEN",
            SEED_SECRET,
            "MASTER_ACCESS_TOKEN",
        ));
        let pre_hook = LifecycleHook {
            failure_policy: "Retry".to_owned(),
            exec_new_pod: Some(ExecNewPodHook {
                command: vec![
                    "bash".to_owned(),
                    "-c".to_owned(),
                    "bundle exec rake boot openshift:deploy".to_owned(),
                ],
                env: hook_env,
                container_name: SYSTEM_MASTER.to_owned(),
                volumes: vec![STORAGE.to_owned()],
            }),
        };

        let mut template = PodTemplateBuilder::new();
        template
            .add_container(Self::portal_container(SYSTEM_MASTER, "master", 3002).build())
            .add_container(Self::portal_container(SYSTEM_PROVIDER, "provider", 3000).build())
            .add_container(Self::portal_container(SYSTEM_DEVELOPER, "developer", 3001).build());
        Self::storage_and_config(&mut template);

        DeploymentConfigBuilder::new(SYSTEM_APP, self.element_labels("app"))
            .replicas(*self.options.app_replicas())
            .strategy(DeploymentStrategy::rolling_with_pre_hook(pre_hook))
            .image_change_trigger(&[SYSTEM_MASTER, SYSTEM_PROVIDER, SYSTEM_DEVELOPER], IMAGE)
            .build(template.build())
    }

    fn sidekiq(&self) -> ResourceObject {
        let container = ContainerBuilder::new(SYSTEM_SIDEKIQ)
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .args(["rake", "sidekiq:worker", "RAILS_MAX_THREADS=25"])
            .add_env_vars(Self::base_env())
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("1000m")
                    .with_memory_limit("2Gi")
                    .with_cpu_request("100m")
                    .with_memory_request("500Mi")
                    .build(),
            )
            .add_volume_mount(STORAGE, STORAGE_MOUNT_PATH)
            .add_volume_mount(CONFIG_VOLUME, CONFIG_MOUNT_PATH)
            .build();

        let mut template = PodTemplateBuilder::new();
        template.add_container(container);
        Self::storage_and_config(&mut template);

        DeploymentConfigBuilder::new(SYSTEM_SIDEKIQ, self.element_labels("sidekiq"))
            .replicas(*self.options.sidekiq_replicas())
            .image_change_trigger(&[SYSTEM_SIDEKIQ], IMAGE)
            .build(template.build())
    }

    fn sphinx(&self) -> ResourceObject {
        let container = ContainerBuilder::new(SYSTEM_SPHINX)
            .image(IMAGE)
            .image_pull_policy("IfNotPresent")
            .args(["rake", "openshift:thinking_sphinx:start"])
            .add_container_port("sphinx", 9306)
            .add_env_var_from_config_map("RAILS_ENV", ENVIRONMENT_CONFIG_MAP, "RAILS_ENV")
            .add_env_var_from_secret(
                "DATABASE_URL",
                super::mysql::DATABASE_SECRET,
                super::mysql::DATABASE_URL_FIELD,
            )
            .add_env_var("THINKING_SPHINX_ADDRESS", "0.0.0.0")
            .add_env_var("THINKING_SPHINX_CONFIGURATION_FILE", "db/sphinx/production.conf")
            .add_env_var("THINKING_SPHINX_PID_FILE", "db/sphinx/searchd.pid")
            .add_env_var("DELTA_INDEX_INTERVAL", "5")
            .add_env_var("FULL_REINDEX_INTERVAL", "60")
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_limit("1000m")
                    .with_memory_limit("512Mi")
                    .with_cpu_request("80m")
                    .with_memory_request("250Mi")
                    .build(),
            )
            .liveness_probe(
                ProbeBuilder::tcp_socket(IntOrString::Int(9306))
                    .initial_delay_seconds(60)
                    .period_seconds(10)
                    .build(),
            )
            .add_volume_mount("system-sphinx-database", "/opt/system/db/sphinx")
            .build();

        let template: PodTemplateSpec = PodTemplateBuilder::new()
            .add_container(container)
            .add_volume(volume::empty_dir("system-sphinx-database"))
            .service_account_name(super::images::SERVICE_ACCOUNT)
            .build();

        DeploymentConfigBuilder::new(SYSTEM_SPHINX, self.element_labels("sphinx"))
            .image_change_trigger(&[SYSTEM_SPHINX], IMAGE)
            .build(template)
    }

    fn routes(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        let domain = options.wildcard_domain();
        vec![
            route(
                "system-provider-admin-route",
                self.element_labels("app"),
                RouteSpec::edge(
                    format!("{}-admin.{domain}", options.tenant_name()),
                    SYSTEM_PROVIDER,
                    "http",
                ),
            ),
            route(
                "system-master-admin-route",
                self.element_labels("app"),
                RouteSpec::edge(
                    format!("{}.{domain}", options.master_name()),
                    SYSTEM_MASTER,
                    "http",
                ),
            ),
            route(
                "system-developer-route",
                self.element_labels("app"),
                RouteSpec::edge(
                    format!("{}.{domain}", options.tenant_name()),
                    SYSTEM_DEVELOPER,
                    "http",
                ),
            ),
        ]
    }

    fn secrets(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        let master_apicast_base = format!(
            "http://{}@{SYSTEM_MASTER}:3000",
            options.apicast_access_token()
        );
        vec![
            secret(
                SEED_SECRET,
                self.labels(),
                [
                    ("MASTER_DOMAIN", options.master_name().clone()),
                    ("MASTER_USER", options.master_username().clone()),
                    ("MASTER_PASSWORD", options.master_password().clone()),
                    ("MASTER_ACCESS_TOKEN", options.master_access_token().clone()),
                    ("TENANT_NAME", options.tenant_name().clone()),
                    ("ADMIN_USER", options.admin_username().clone()),
                    ("ADMIN_PASSWORD", options.admin_password().clone()),
                    ("ADMIN_EMAIL", options.admin_email().clone()),
                    ("ADMIN_ACCESS_TOKEN", options.admin_access_token().clone()),
                ],
            ),
            secret(
                MASTER_APICAST_SECRET,
                self.labels(),
                [
                    ("ACCESS_TOKEN", options.apicast_access_token().clone()),
                    (
                        "PROXY_CONFIGS_ENDPOINT",
                        format!("{master_apicast_base}/master/api/proxy/configs"),
                    ),
                    ("BASE_URL", master_apicast_base),
                ],
            ),
            secret(
                APP_SECRET,
                self.labels(),
                [("SECRET_KEY_BASE", options.app_secret_key_base().clone())],
            ),
            secret(
                EVENTS_HOOK_SECRET,
                self.labels(),
                [
                    (
                        "URL",
                        format!("http://{SYSTEM_MASTER}:3000/master/events/import"),
                    ),
                    ("PASSWORD", options.backend_shared_secret().clone()),
                ],
            ),
            secret(
                RECAPTCHA_SECRET,
                self.labels(),
                [
                    ("PUBLIC_KEY", options.recaptcha_public_key().clone()),
                    ("PRIVATE_KEY", options.recaptcha_private_key().clone()),
                ],
            ),
            secret(
                REDIS_SECRET,
                self.labels(),
                [(REDIS_URL_FIELD, options.redis_url().clone())],
            ),
        ]
    }
}

impl Component for System {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        let mut objects = vec![
            persistent_volume_claim(
                STORAGE,
                self.labels(),
                "ReadWriteMany",
                "100Mi",
                options.storage_class_name(),
            ),
            service(
                SYSTEM_PROVIDER,
                self.element_labels("provider-ui"),
                SYSTEM_APP,
                &[("http", 3000, "provider")],
            ),
            service(
                SYSTEM_MASTER,
                self.element_labels("master-ui"),
                SYSTEM_APP,
                &[("http", 3000, "master")],
            ),
            service(
                SYSTEM_DEVELOPER,
                self.element_labels("developer-ui"),
                SYSTEM_APP,
                &[("http", 3000, "developer")],
            ),
            service(
                SYSTEM_SPHINX,
                self.element_labels("sphinx"),
                SYSTEM_SPHINX,
                &[("sphinx", 9306, "sphinx")],
            ),
            config_map(
                CONFIG_MAP,
                self.labels(),
                [
                    ("zync.yml", ZYNC_CONFIG.to_owned()),
                    ("rolling_updates.yml", ROLLING_UPDATES_CONFIG.to_owned()),
                    ("service_discovery.yml", SERVICE_DISCOVERY_CONFIG.to_owned()),
                ],
            ),
            config_map(
                ENVIRONMENT_CONFIG_MAP,
                self.labels(),
                [
                    ("AMP_RELEASE", options.amp_release().clone()),
                    ("APICAST_REGISTRY_URL", options.apicast_registry_url().clone()),
                    ("FORCE_SSL", "true".to_owned()),
                    ("PROVIDER_PLAN", "enterprise".to_owned()),
                    ("RAILS_ENV", "production".to_owned()),
                    ("RAILS_LOG_LEVEL", "info".to_owned()),
                    ("RAILS_LOG_TO_STDOUT", "true".to_owned()),
                    ("SSL_CERT_DIR", "/etc/pki/tls/certs".to_owned()),
                    ("THINKING_SPHINX_PORT", "9306".to_owned()),
                    (
                        "THREESCALE_SANDBOX_PROXY_OPENSSL_VERIFY_MODE",
                        "VERIFY_NONE".to_owned(),
                    ),
                    ("THREESCALE_SUPERDOMAIN", options.wildcard_domain().clone()),
                ],
            ),
        ];
        objects.extend(self.routes());
        objects.extend(self.secrets());
        objects.extend([self.app(), self.sidekiq(), self.sphinx()]);
        objects
    }
}

pub fn capabilities() -> Capabilities {
    let mut capabilities = Capabilities::default().with_endpoint(
        ExternalEndpoint::SystemRedis,
        REDIS_SECRET,
        REDIS_URL_FIELD,
    );
    capabilities
        .singleton_workloads
        .insert(SYSTEM_SPHINX.to_owned());
    capabilities.shared_storage.push(SharedStorage {
        volume: STORAGE.to_owned(),
        claim: STORAGE.to_owned(),
        parameter: None,
        workloads: [SYSTEM_APP.to_owned(), SYSTEM_SIDEKIQ.to_owned()].into(),
        environment_config_map: ENVIRONMENT_CONFIG_MAP.to_owned(),
    });
    capabilities
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::ConfigMap;

    use super::*;
    use crate::{
        component::test_support::{assert_labelled, assert_services_select_workloads},
        openshift::DeploymentConfig,
    };

    fn options() -> SystemOptions {
        SystemOptions::builder()
            .app_label("3scale-api-management")
            .amp_release("2.5")
            .admin_password("admin-password")
            .admin_username("admin")
            .admin_access_token("admin-token")
            .master_name("master")
            .master_username("master")
            .master_password("master-password")
            .master_access_token("master-token")
            .app_secret_key_base("key-base")
            .backend_shared_secret("shared")
            .tenant_name("3scale")
            .wildcard_domain("apps.example.com")
            .apicast_access_token("apicast-token")
            .apicast_registry_url("http://apicast-staging:8090/policies")
            .build()
            .expect("all required fields are set")
    }

    #[test]
    fn defaults() {
        let options = options();

        assert_eq!(options.admin_email(), "");
        assert_eq!(options.recaptcha_public_key(), "");
        assert_eq!(options.redis_url(), "redis://system-redis:6379/1");
        assert_eq!(options.app_replicas(), &1);
        assert_eq!(options.storage_class_name(), None);
    }

    #[test]
    fn objects_are_labelled_and_selectable() {
        let objects = System::new(options()).objects();

        assert_labelled(&objects);
        assert_services_select_workloads(&objects);
    }

    #[test]
    fn app_hook_mounts_shared_storage() {
        let objects = System::new(options()).objects();
        let app = objects
            .iter()
            .find_map(|object| match object {
                ResourceObject::DeploymentConfig(DeploymentConfig { spec, metadata, .. })
                    if metadata.name.as_deref() == Some(SYSTEM_APP) =>
                {
                    Some(spec)
                }
                _ => None,
            })
            .expect("system-app is generated");

        let hook = app.strategy.pre_hook().expect("system-app has a pre hook");
        assert_eq!(hook.container_name, SYSTEM_MASTER);
        assert_eq!(hook.volumes, [STORAGE]);
    }

    #[test]
    fn environment_config_map_backs_every_referenced_key() {
        let objects = System::new(options()).objects();
        let data = objects
            .iter()
            .find_map(|object| match object {
                ResourceObject::ConfigMap(ConfigMap { metadata, data, .. })
                    if metadata.name.as_deref() == Some(ENVIRONMENT_CONFIG_MAP) =>
                {
                    data.as_ref()
                }
                _ => None,
            })
            .expect("environment config map is generated");

        for key in ENVIRONMENT_KEYS {
            assert!(data.contains_key(key), "{key} is referenced but not defined");
        }
    }
}
