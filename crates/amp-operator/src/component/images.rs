use k8s_openapi::api::core::v1::{LocalObjectReference, ServiceAccount};

use super::{Capabilities, Component, ProductImage, metadata};
use crate::{
    labels,
    object::{ObjectKind, ResourceObject},
    openshift::{
        ImageStream, ImageStreamSpec,
        image_stream::{LATEST_TAG, TagReference},
    },
    options::define_options,
};

pub const AMP_BACKEND: &str = "amp-backend";
pub const AMP_ZYNC: &str = "amp-zync";
pub const AMP_APICAST: &str = "amp-apicast";
pub const AMP_WILDCARD_ROUTER: &str = "amp-wildcard-router";
pub const AMP_SYSTEM: &str = "amp-system";
pub const POSTGRESQL: &str = "postgresql";
pub const BACKEND_REDIS: &str = "backend-redis";
pub const SYSTEM_REDIS: &str = "system-redis";
pub const SYSTEM_MEMCACHED: &str = "system-memcached";
pub const SYSTEM_MYSQL: &str = "system-mysql";

pub const SERVICE_ACCOUNT: &str = "amp";
pub const REGISTRY_PULL_SECRET: &str = "threescale-registry-auth";

define_options! {
    /// Image references of every platform image stream.
    AmpImagesOptions, AmpImagesOptionsBuilder {
        required {
            app_label: String,
            amp_release: String,
            apicast_image: String,
            backend_image: String,
            router_image: String,
            system_image: String,
            zync_image: String,
            postgresql_image: String,
            backend_redis_image: String,
            system_redis_image: String,
            system_memcached_image: String,
            system_mysql_image: String,
        }
        optional { insecure_import_policy: bool = false }
        omittable {}
    }
}

pub struct AmpImages {
    options: AmpImagesOptions,
}

impl AmpImages {
    pub fn new(options: AmpImagesOptions) -> Self {
        Self { options }
    }

    fn image_stream(&self, name: &str, display_name: &str, image: &str) -> ResourceObject {
        let release = self.options.amp_release();
        let mut metadata = metadata(
            name,
            labels::sets::component(self.options.app_label(), "images"),
        );
        metadata.annotations = Some(
            [(
                "openshift.io/display-name".to_owned(),
                display_name.to_owned(),
            )]
            .into(),
        );

        let mut latest = TagReference::alias(LATEST_TAG, release.as_str());
        latest.annotations = [(
            "openshift.io/display-name".to_owned(),
            format!("{display_name} (latest)"),
        )]
        .into();

        let mut released = TagReference::docker_image(
            release.as_str(),
            image,
            *self.options.insecure_import_policy(),
        );
        released.annotations = [(
            "openshift.io/display-name".to_owned(),
            format!("{display_name} {release}"),
        )]
        .into();

        ImageStream {
            metadata,
            spec: ImageStreamSpec {
                tags: vec![latest, released],
            },
        }
        .into()
    }
}

impl Component for AmpImages {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        vec![
            self.image_stream(AMP_BACKEND, "AMP backend", options.backend_image()),
            self.image_stream(AMP_ZYNC, "AMP Zync", options.zync_image()),
            self.image_stream(AMP_APICAST, "AMP APIcast", options.apicast_image()),
            self.image_stream(
                AMP_WILDCARD_ROUTER,
                "AMP APIcast Wildcard Router",
                options.router_image(),
            ),
            self.image_stream(AMP_SYSTEM, "AMP System", options.system_image()),
            self.image_stream(
                POSTGRESQL,
                "Zync database PostgreSQL",
                options.postgresql_image(),
            ),
            self.image_stream(BACKEND_REDIS, "Backend Redis", options.backend_redis_image()),
            self.image_stream(SYSTEM_REDIS, "System Redis", options.system_redis_image()),
            self.image_stream(
                SYSTEM_MEMCACHED,
                "System Memcached",
                options.system_memcached_image(),
            ),
            self.image_stream(SYSTEM_MYSQL, "System MySQL", options.system_mysql_image()),
            ServiceAccount {
                metadata: metadata(
                    SERVICE_ACCOUNT,
                    labels::sets::component(options.app_label(), "images"),
                ),
                image_pull_secrets: Some(vec![LocalObjectReference {
                    name: REGISTRY_PULL_SECRET.to_owned(),
                }]),
                ..ServiceAccount::default()
            }
            .into(),
        ]
    }
}

pub fn capabilities() -> Capabilities {
    let mut capabilities = Capabilities::default().with_external_database_objects(
        ObjectKind::ImageStream,
        [BACKEND_REDIS, SYSTEM_REDIS, SYSTEM_MYSQL],
    );
    capabilities.product_image_streams = [
        (AMP_APICAST.to_owned(), ProductImage::Apicast),
        (AMP_BACKEND.to_owned(), ProductImage::Backend),
        (AMP_SYSTEM.to_owned(), ProductImage::System),
        (AMP_WILDCARD_ROUTER.to_owned(), ProductImage::WildcardRouter),
        (AMP_ZYNC.to_owned(), ProductImage::Zync),
    ]
    .into();
    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::test_support::assert_labelled;

    fn options() -> AmpImagesOptions {
        AmpImagesOptions::builder()
            .app_label("3scale-api-management")
            .amp_release("2.5")
            .apicast_image("quay.io/3scale/apicast:nightly")
            .backend_image("quay.io/3scale/apisonator:nightly")
            .router_image("quay.io/3scale/wildcard-router:nightly")
            .system_image("quay.io/3scale/porta:nightly")
            .zync_image("quay.io/3scale/zync:nightly")
            .postgresql_image("centos/postgresql-10-centos7")
            .backend_redis_image("centos/redis-32-centos7")
            .system_redis_image("centos/redis-32-centos7")
            .system_memcached_image("memcached:1.5")
            .system_mysql_image("centos/mysql-57-centos7")
            .build()
            .expect("all required fields are set")
    }

    #[test]
    fn every_stream_has_latest_and_release_tag() {
        let objects = AmpImages::new(options()).objects();
        assert_labelled(&objects);

        let streams: Vec<_> = objects
            .iter()
            .filter_map(|object| match object {
                ResourceObject::ImageStream(stream) => Some(stream),
                _ => None,
            })
            .collect();
        assert_eq!(streams.len(), 10);

        for stream in streams {
            let tags: Vec<_> = stream.spec.tags.iter().map(|tag| tag.name.as_str()).collect();
            assert_eq!(tags, [LATEST_TAG, "2.5"]);

            let latest_from = stream.spec.tags[0].from.as_ref().expect("latest follows a tag");
            assert_eq!(latest_from.kind.as_deref(), Some("ImageStreamTag"));
            assert_eq!(latest_from.name.as_deref(), Some("2.5"));

            let release = &stream.spec.tags[1];
            assert_eq!(
                release.from.as_ref().and_then(|from| from.kind.as_deref()),
                Some("DockerImage")
            );
            assert_eq!(
                release.import_policy.as_ref().and_then(|policy| policy.insecure),
                Some(false)
            );
        }
    }

    #[test]
    fn service_account_pulls_with_registry_secret() {
        let objects = AmpImages::new(options()).objects();
        let account = objects
            .iter()
            .find_map(|object| match object {
                ResourceObject::ServiceAccount(account) => Some(account),
                _ => None,
            })
            .expect("a service account is generated");

        assert_eq!(account.metadata.name.as_deref(), Some(SERVICE_ACCOUNT));
        assert_eq!(
            account.image_pull_secrets.as_deref(),
            Some(
                [LocalObjectReference {
                    name: REGISTRY_PULL_SECRET.to_owned()
                }]
                .as_slice()
            )
        );
    }

    #[test]
    fn defaults() {
        assert!(!options().insecure_import_policy());
    }
}
