//! The objects an `APIcast` custom resource converges to.
use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{Secret, Service, ServicePort, ServiceSpec},
        networking::v1::{
            HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
            IngressServiceBackend, IngressSpec, ServiceBackendPort,
        },
    },
    apimachinery::pkg::{
        apis::meta::v1::{LabelSelector, ObjectMeta},
        util::intstr::IntOrString,
    },
};
use kube::ResourceExt;
use snafu::{OptionExt, ResultExt, Snafu};
use url::Url;

use super::crd::{APIcast, DEFAULT_IMAGE, DEFAULT_REPLICAS, DEFAULT_SERVICE_ACCOUNT};
use crate::{
    builder::{
        self,
        meta::ObjectMetaBuilder,
        pod::{
            PodTemplateBuilder, container::ContainerBuilder, env::env_from_secret,
            probe::ProbeBuilder,
        },
    },
    labels::{self, Labels},
};

pub const APP_LABEL: &str = "apicast";
pub const ADMIN_PORTAL_URL_FIELD: &str = "AdminPortalURL";

const PROXY_PORT_NAME: &str = "proxy";
const PROXY_PORT: i32 = 8080;
const MANAGEMENT_PORT_NAME: &str = "management";
const MANAGEMENT_PORT: i32 = 8090;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("admin portal URL {url:?} is not a valid URL"))]
    ParseAdminPortalUrl { source: url::ParseError, url: String },

    #[snafu(display("admin portal URL {url:?} cannot carry an access token"))]
    AdminPortalUrlWithoutHost { url: String },

    #[snafu(display("replica count {replicas} is out of range"))]
    ReplicasOutOfRange {
        source: std::num::TryFromIntError,
        replicas: i64,
    },

    #[snafu(display("failed to set the owner reference to the APIcast"))]
    OwnerReference { source: builder::meta::Error },

    #[snafu(display("APIcast {name:?} has no namespace"))]
    MissingNamespace { name: String },
}

/// Admin portal coordinates read from the referenced secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminPortalCredentials {
    pub url: String,
    pub access_token: String,
}

impl std::fmt::Debug for AdminPortalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminPortalCredentials")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl AdminPortalCredentials {
    /// The admin portal URL with the access token as user info, the form the gateway expects
    /// its portal endpoint in.
    pub fn endpoint(&self) -> Result<String> {
        let mut url = Url::parse(&self.url).context(ParseAdminPortalUrlSnafu { url: &self.url })?;
        url.set_username(&self.access_token)
            .ok()
            .context(AdminPortalUrlWithoutHostSnafu { url: &self.url })?;
        Ok(url.into())
    }
}

/// Every object of one `APIcast`, in the order they are reconciled.
#[derive(Clone, Debug)]
pub struct DesiredObjects {
    pub admin_portal_endpoint: Secret,
    pub deployment: Deployment,
    pub service: Service,
    pub ingress: Option<Ingress>,
}

pub fn workload_name(apicast: &APIcast) -> String {
    format!("apicast-{}", apicast.name_any())
}

pub fn admin_portal_endpoint_name(apicast: &APIcast) -> String {
    format!("{}-admin-portal-endpoint", workload_name(apicast))
}

/// Builds the objects of `apicast`. Unset optional spec fields fall back to their defaults.
pub fn build(apicast: &APIcast, credentials: &AdminPortalCredentials) -> Result<DesiredObjects> {
    let builder = DesiredBuilder::new(apicast)?;
    Ok(DesiredObjects {
        admin_portal_endpoint: builder.admin_portal_endpoint(credentials)?,
        deployment: builder.deployment()?,
        service: builder.service()?,
        ingress: builder.ingress()?,
    })
}

struct DesiredBuilder<'a> {
    apicast: &'a APIcast,
    name: String,
    namespace: String,
    labels: Labels,
}

impl<'a> DesiredBuilder<'a> {
    fn new(apicast: &'a APIcast) -> Result<Self> {
        let namespace = apicast.namespace().context(MissingNamespaceSnafu {
            name: apicast.name_any(),
        })?;
        Ok(Self {
            apicast,
            name: workload_name(apicast),
            namespace,
            labels: labels::sets::component(APP_LABEL, APP_LABEL),
        })
    }

    fn metadata(&self, name: &str) -> Result<ObjectMeta> {
        Ok(ObjectMetaBuilder::new()
            .name(name)
            .namespace(&self.namespace)
            .with_labels(self.labels.clone())
            .ownerreference_from_resource(self.apicast, None, Some(true))
            .context(OwnerReferenceSnafu)?
            .build())
    }

    fn admin_portal_endpoint(&self, credentials: &AdminPortalCredentials) -> Result<Secret> {
        Ok(Secret {
            metadata: self.metadata(&admin_portal_endpoint_name(self.apicast))?,
            string_data: Some(
                [(ADMIN_PORTAL_URL_FIELD.to_owned(), credentials.endpoint()?)].into(),
            ),
            type_: Some("Opaque".to_owned()),
            ..Secret::default()
        })
    }

    fn deployment(&self) -> Result<Deployment> {
        let spec = &self.apicast.spec;
        let replicas = spec.replicas.unwrap_or(DEFAULT_REPLICAS);
        let replicas =
            i32::try_from(replicas).context(ReplicasOutOfRangeSnafu { replicas })?;

        let mut container = ContainerBuilder::new(&self.name);
        container
            .image(spec.image.as_deref().unwrap_or(DEFAULT_IMAGE))
            .image_pull_policy("IfNotPresent")
            .add_container_port(PROXY_PORT_NAME, PROXY_PORT)
            .add_container_port(MANAGEMENT_PORT_NAME, MANAGEMENT_PORT)
            .add_env_var_from_secret(
                "THREESCALE_PORTAL_ENDPOINT",
                admin_portal_endpoint_name(self.apicast),
                ADMIN_PORTAL_URL_FIELD,
            )
            .add_env_var("THREESCALE_DEPLOYMENT_ENV", "production")
            .add_env_var("APICAST_CONFIGURATION_LOADER", "boot")
            .add_env_var("APICAST_CONFIGURATION_CACHE", "300")
            .readiness_probe(
                ProbeBuilder::http_get(
                    IntOrString::String(MANAGEMENT_PORT_NAME.to_owned()),
                    "/status/ready",
                )
                .initial_delay_seconds(15)
                .timeout_seconds(5)
                .period_seconds(30)
                .build(),
            )
            .liveness_probe(
                ProbeBuilder::http_get(
                    IntOrString::String(MANAGEMENT_PORT_NAME.to_owned()),
                    "/status/live",
                )
                .initial_delay_seconds(10)
                .timeout_seconds(5)
                .period_seconds(10)
                .build(),
            );
        if let Some(secret) = &spec.environment_configuration_secret_ref {
            container.add_env_from(env_from_secret(&secret.name));
        }

        let template = PodTemplateBuilder::new()
            .labels(labels::sets::pod(&self.labels, &self.name))
            .service_account_name(
                spec.service_account
                    .as_deref()
                    .unwrap_or(DEFAULT_SERVICE_ACCOUNT),
            )
            .add_container(container.build())
            .build();

        Ok(Deployment {
            metadata: self.metadata(&self.name)?,
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                selector: LabelSelector {
                    match_labels: Some(labels::sets::workload_selector(&self.name)),
                    ..LabelSelector::default()
                },
                template,
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        })
    }

    fn service(&self) -> Result<Service> {
        let port = |name: &str, port: i32| ServicePort {
            name: Some(name.to_owned()),
            port,
            protocol: Some("TCP".to_owned()),
            target_port: Some(IntOrString::String(name.to_owned())),
            ..ServicePort::default()
        };
        Ok(Service {
            metadata: self.metadata(&self.name)?,
            spec: Some(ServiceSpec {
                ports: Some(vec![
                    port(PROXY_PORT_NAME, PROXY_PORT),
                    port(MANAGEMENT_PORT_NAME, MANAGEMENT_PORT),
                ]),
                selector: Some(labels::sets::workload_selector(&self.name)),
                ..ServiceSpec::default()
            }),
            ..Service::default()
        })
    }

    fn ingress(&self) -> Result<Option<Ingress>> {
        let Some(host) = &self.apicast.spec.exposed_hostname else {
            return Ok(None);
        };
        Ok(Some(Ingress {
            metadata: self.metadata(&self.name)?,
            spec: Some(IngressSpec {
                rules: Some(vec![IngressRule {
                    host: Some(host.clone()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_owned()),
                            path_type: "Prefix".to_owned(),
                            backend: IngressBackend {
                                service: Some(IngressServiceBackend {
                                    name: self.name.clone(),
                                    port: Some(ServiceBackendPort {
                                        name: Some(PROXY_PORT_NAME.to_owned()),
                                        number: None,
                                    }),
                                }),
                                ..IngressBackend::default()
                            },
                        }],
                    }),
                }]),
                ..IngressSpec::default()
            }),
            ..Ingress::default()
        }))
    }
}
