//! Object storage credentials for system file uploads.
//!
//! The structural changes that go with it live in
//! [`crate::transform::external_storage`].
use super::{Capabilities, Component, secret};
use crate::{labels, object::ResourceObject, options::define_options};

pub const ACCESS_KEY_ID_FIELD: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_FIELD: &str = "AWS_SECRET_ACCESS_KEY";

define_options! {
    S3Options, S3OptionsBuilder {
        required {
            app_label: String,
            aws_access_key_id: String,
            aws_secret_access_key: String,
            aws_region: String,
            aws_bucket: String,
            aws_credentials_secret: String,
        }
        optional { file_upload_storage: String = "s3" }
        omittable {}
    }
}

pub struct S3 {
    options: S3Options,
}

impl S3 {
    pub fn new(options: S3Options) -> Self {
        Self { options }
    }
}

impl Component for S3 {
    fn objects(&self) -> Vec<ResourceObject> {
        let options = &self.options;
        vec![secret(
            options.aws_credentials_secret(),
            labels::sets::component(options.app_label(), "system"),
            [
                (ACCESS_KEY_ID_FIELD, options.aws_access_key_id().clone()),
                (SECRET_ACCESS_KEY_FIELD, options.aws_secret_access_key().clone()),
            ],
        )]
    }
}

pub fn capabilities() -> Capabilities {
    Capabilities::default()
}
