//! The `APIcast` custom resource.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPLICAS: i64 = 1;
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";
pub const DEFAULT_IMAGE: &str = "registry.access.redhat.com/3scale-amp25/apicast-gateway";

/// A standalone API gateway fetching its configuration from an admin portal.
#[derive(
    CustomResource, Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq,
)]
#[kube(
    group = "apps.3scale.net",
    version = "v1alpha1",
    kind = "APIcast",
    plural = "apicasts",
    shortname = "apicast",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct APIcastSpec {
    /// Number of gateway pods. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Service account the gateway pods run as. Defaults to `default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,

    /// Host name the gateway is exposed on through an Ingress. No Ingress is created if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_hostname: Option<String>,

    pub admin_portal_credentials_ref: AdminPortalCredentialsRef,

    /// Secret whose entries are added to the gateway environment. It must exist if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_configuration_secret_ref: Option<SecretRef>,
}

/// Where the admin portal URL and its access token are stored.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminPortalCredentialsRef {
    pub url_secret_key_ref: SecretKeyRef,
    pub access_token_secret_key_ref: SecretKeyRef,
}

/// A key of a Secret in the namespace of the custom resource.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub struct SecretKeyRef {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub struct SecretRef {
    #[serde(default)]
    pub name: String,
}

impl APIcastSpec {
    /// Fills unset optional fields. Returns whether anything was filled.
    pub fn set_missing_defaults(&mut self) -> bool {
        let mut filled = false;
        if self.replicas.is_none() {
            self.replicas = Some(DEFAULT_REPLICAS);
            filled = true;
        }
        if self.service_account.is_none() {
            self.service_account = Some(DEFAULT_SERVICE_ACCOUNT.to_owned());
            filled = true;
        }
        if self.image.is_none() {
            self.image = Some(DEFAULT_IMAGE.to_owned());
            filled = true;
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn fills_missing_defaults_once() {
        let mut spec: APIcastSpec = serde_yaml::from_str(indoc! {"
            adminPortalCredentialsRef:
              urlSecretKeyRef:
                name: portal
                key: url
              accessTokenSecretKeyRef:
                name: portal
                key: token
            exposedHostname: api.example.com
        "})
        .expect("spec is valid");

        assert!(spec.set_missing_defaults());
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(spec.service_account.as_deref(), Some("default"));
        assert_eq!(spec.image.as_deref(), Some(DEFAULT_IMAGE));
        assert_eq!(
            spec.admin_portal_credentials_ref.access_token_secret_key_ref.key,
            "token"
        );
        assert!(!spec.set_missing_defaults());
    }

    #[test]
    fn keeps_explicit_values() {
        let mut spec = APIcastSpec {
            replicas: Some(3),
            image: Some("quay.io/3scale/apicast:nightly".to_owned()),
            service_account: Some("apicast".to_owned()),
            ..APIcastSpec::default()
        };
        assert!(!spec.set_missing_defaults());
        assert_eq!(spec.replicas, Some(3));
    }

    #[test]
    fn schema_names_group_and_short_name() {
        use amp_shared::crd::CustomResourceExt as _;

        let schema = APIcast::yaml_schema().expect("schema serializes");
        assert!(schema.starts_with("---\n"));
        assert!(schema.contains("name: apicasts.apps.3scale.net"));
        assert!(schema.contains("- apicast"));
        assert!(schema.contains("adminPortalCredentialsRef"));
    }
}
