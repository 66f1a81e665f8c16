//! Points product images at the curated registry.
use k8s_openapi::api::core::v1::ObjectReference;

use super::{Result, TransformStage, Transformer};
use crate::{
    component::ProductImage, object::ResourceObject, options::define_options, template::Bundle,
};

pub const APICAST_IMAGE: &str = "registry.access.redhat.com/3scale-amp25/apicast-gateway";
pub const BACKEND_IMAGE: &str = "registry.access.redhat.com/3scale-amp25/backend";
pub const ROUTER_IMAGE: &str = "registry.access.redhat.com/3scale-amp22/wildcard-router";
pub const SYSTEM_IMAGE: &str = "registry.access.redhat.com/3scale-amp25/system";
pub const ZYNC_IMAGE: &str = "registry.access.redhat.com/3scale-amp25/zync";

define_options! {
    /// Release and curated image coordinates of a productized build.
    ProductizedOptions, ProductizedOptionsBuilder {
        required {
            amp_release: String,
            apicast_image: String,
            backend_image: String,
            router_image: String,
            system_image: String,
            zync_image: String,
        }
        optional {}
        omittable {}
    }
}

impl ProductizedOptions {
    pub fn image(&self, image: ProductImage) -> &str {
        match image {
            ProductImage::Apicast => self.apicast_image(),
            ProductImage::Backend => self.backend_image(),
            ProductImage::System => self.system_image(),
            ProductImage::WildcardRouter => self.router_image(),
            ProductImage::Zync => self.zync_image(),
        }
    }
}

/// Rewrites the default of every product image parameter and the release tag of every product
/// image stream.
///
/// Only the tag named after the release is rewritten. The floating `latest` alias keeps
/// pointing at the release tag.
#[derive(Clone, Debug)]
pub struct Productized {
    options: ProductizedOptions,
}

impl Productized {
    pub fn new(options: ProductizedOptions) -> Self {
        Self { options }
    }
}

impl Transformer for Productized {
    fn name(&self) -> &'static str {
        "productized"
    }

    fn stage(&self) -> TransformStage {
        TransformStage::Productized
    }

    fn transform(&self, mut bundle: Bundle) -> Result<Bundle> {
        let capabilities = bundle.capabilities().clone();

        for (name, image) in &capabilities.product_image_parameters {
            if let Some(parameter) = bundle.parameter_mut(name) {
                parameter.value = Some(self.options.image(*image).to_owned());
            }
        }

        for object in bundle.objects_mut() {
            let ResourceObject::ImageStream(image_stream) = object else {
                continue;
            };
            let Some(image) = image_stream
                .metadata
                .name
                .as_ref()
                .and_then(|name| capabilities.product_image_streams.get(name))
            else {
                continue;
            };

            for tag in &mut image_stream.spec.tags {
                if tag.name != *self.options.amp_release() {
                    continue;
                }
                tag.from = Some(ObjectReference {
                    kind: Some("DockerImage".to_owned()),
                    name: Some(self.options.image(*image).to_owned()),
                    ..ObjectReference::default()
                });
            }
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        component::{
            Component,
            images::{self, AmpImages, AmpImagesOptions},
        },
        openshift::image_stream::LATEST_TAG,
        template::Parameter,
    };

    fn options() -> ProductizedOptions {
        ProductizedOptions::builder()
            .amp_release("2.5.0")
            .apicast_image(APICAST_IMAGE)
            .backend_image(BACKEND_IMAGE)
            .router_image(ROUTER_IMAGE)
            .system_image(SYSTEM_IMAGE)
            .zync_image(ZYNC_IMAGE)
            .build()
            .expect("all required fields are set")
    }

    fn bundle() -> Bundle {
        let images = AmpImagesOptions::builder()
            .app_label("3scale-api-management")
            .amp_release("2.5.0")
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
            .expect("all required fields are set");

        let mut bundle = Bundle::new();
        bundle
            .push_parameter(
                Parameter::required("AMP_BACKEND_IMAGE")
                    .with_value("quay.io/3scale/apisonator:nightly"),
            )
            .expect("unique");
        bundle
            .push_parameter(
                Parameter::required("MYSQL_IMAGE").with_value("centos/mysql-57-centos7"),
            )
            .expect("unique");
        for object in AmpImages::new(images).objects() {
            bundle.push_object(object).expect("unique");
        }

        let mut capabilities = images::capabilities();
        capabilities
            .product_image_parameters
            .insert("AMP_BACKEND_IMAGE".to_owned(), ProductImage::Backend);
        bundle.merge_capabilities(capabilities);
        bundle
    }

    fn tag_source(bundle: &Bundle, stream: &str, tag: &str) -> Option<String> {
        bundle.objects().find_map(|object| match object {
            ResourceObject::ImageStream(image_stream)
                if image_stream.metadata.name.as_deref() == Some(stream) =>
            {
                image_stream
                    .spec
                    .tags
                    .iter()
                    .find(|reference| reference.name == tag)
                    .and_then(|reference| reference.from.as_ref()?.name.clone())
            }
            _ => None,
        })
    }

    #[test]
    fn rewrites_release_tags_and_parameters_of_product_images() {
        let bundle = Productized::new(options())
            .transform(bundle())
            .expect("productized never fails");

        assert_eq!(
            tag_source(&bundle, images::AMP_BACKEND, "2.5.0").as_deref(),
            Some(BACKEND_IMAGE)
        );
        assert_eq!(
            tag_source(&bundle, images::AMP_WILDCARD_ROUTER, "2.5.0").as_deref(),
            Some(ROUTER_IMAGE)
        );
        assert_eq!(
            bundle
                .parameter("AMP_BACKEND_IMAGE")
                .and_then(|parameter| parameter.value.as_deref()),
            Some(BACKEND_IMAGE)
        );
    }

    #[test]
    fn keeps_latest_alias_and_foreign_images() {
        let before = bundle();
        let latest_before = tag_source(&before, images::AMP_BACKEND, LATEST_TAG);
        let bundle = Productized::new(options())
            .transform(before)
            .expect("productized never fails");

        assert_eq!(tag_source(&bundle, images::AMP_BACKEND, LATEST_TAG), latest_before);
        assert_eq!(
            tag_source(&bundle, images::SYSTEM_MYSQL, "2.5.0").as_deref(),
            Some("centos/mysql-57-centos7")
        );
        assert_eq!(
            bundle
                .parameter("MYSQL_IMAGE")
                .and_then(|parameter| parameter.value.as_deref()),
            Some("centos/mysql-57-centos7")
        );
    }
}
