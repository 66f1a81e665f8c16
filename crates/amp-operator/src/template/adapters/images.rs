use super::{AMP_RELEASE, APP_LABEL, p};
use crate::{
    component::{
        Capabilities, Component, ProductImage,
        images::{self, AmpImages, AmpImagesOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const AMP_BACKEND_IMAGE: &str = "AMP_BACKEND_IMAGE";
pub const AMP_ZYNC_IMAGE: &str = "AMP_ZYNC_IMAGE";
pub const AMP_APICAST_IMAGE: &str = "AMP_APICAST_IMAGE";
pub const AMP_ROUTER_IMAGE: &str = "AMP_ROUTER_IMAGE";
pub const AMP_SYSTEM_IMAGE: &str = "AMP_SYSTEM_IMAGE";
pub const POSTGRESQL_IMAGE: &str = "POSTGRESQL_IMAGE";
pub const MYSQL_IMAGE: &str = "MYSQL_IMAGE";
pub const MEMCACHED_IMAGE: &str = "MEMCACHED_IMAGE";

pub struct ImagesAdapter;

impl ImagesAdapter {
    fn options() -> Result<AmpImagesOptions, options::Error> {
        AmpImagesOptions::builder()
            .app_label(p(APP_LABEL))
            .amp_release(p(AMP_RELEASE))
            .apicast_image(p(AMP_APICAST_IMAGE))
            .backend_image(p(AMP_BACKEND_IMAGE))
            .router_image(p(AMP_ROUTER_IMAGE))
            .system_image(p(AMP_SYSTEM_IMAGE))
            .zync_image(p(AMP_ZYNC_IMAGE))
            .postgresql_image(p(POSTGRESQL_IMAGE))
            .backend_redis_image(p(super::redis::REDIS_IMAGE))
            .system_redis_image(p(super::redis::REDIS_IMAGE))
            .system_memcached_image(p(MEMCACHED_IMAGE))
            .system_mysql_image(p(MYSQL_IMAGE))
            .insecure_import_policy(false)
            .build()
    }
}

impl Adapter for ImagesAdapter {
    fn name(&self) -> &'static str {
        "images"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(AMP_BACKEND_IMAGE).with_value("quay.io/3scale/apisonator:nightly"),
            Parameter::required(AMP_ZYNC_IMAGE).with_value("quay.io/3scale/zync:nightly"),
            Parameter::required(AMP_APICAST_IMAGE).with_value("quay.io/3scale/apicast:nightly"),
            Parameter::required(AMP_ROUTER_IMAGE)
                .with_value("quay.io/3scale/wildcard-router:nightly"),
            Parameter::required(AMP_SYSTEM_IMAGE).with_value("quay.io/3scale/porta:nightly"),
            Parameter::required(POSTGRESQL_IMAGE)
                .with_description("Postgresql image to use")
                .with_value("registry.access.redhat.com/rhscl/postgresql-10-rhel7"),
            Parameter::required(MYSQL_IMAGE)
                .with_description("Mysql image to use")
                .with_value("registry.access.redhat.com/rhscl/mysql-57-rhel7:5.7"),
            Parameter::required(MEMCACHED_IMAGE)
                .with_description("Memcached image to use")
                .with_value("registry.access.redhat.com/3scale-amp20/memcached"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        Ok(AmpImages::new(Self::options()?).objects())
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = images::capabilities();
        capabilities
            .external_database_parameters
            .insert(MYSQL_IMAGE.to_owned());
        capabilities.product_image_parameters = [
            (AMP_APICAST_IMAGE.to_owned(), ProductImage::Apicast),
            (AMP_BACKEND_IMAGE.to_owned(), ProductImage::Backend),
            (AMP_ROUTER_IMAGE.to_owned(), ProductImage::WildcardRouter),
            (AMP_SYSTEM_IMAGE.to_owned(), ProductImage::System),
            (AMP_ZYNC_IMAGE.to_owned(), ProductImage::Zync),
        ]
        .into();
        capabilities
    }
}
