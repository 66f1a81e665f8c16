use super::{APP_LABEL, p};
use crate::{
    component::{
        Capabilities, Component,
        s3::{self, S3, S3Options},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_BUCKET: &str = "AWS_BUCKET";
pub const AWS_REGION: &str = "AWS_REGION";

pub const AWS_CREDENTIALS_SECRET: &str = "aws-auth";

/// Declares the object storage parameters and appends the credentials secret.
pub struct S3Adapter;

impl S3Adapter {
    pub fn options() -> Result<S3Options, options::Error> {
        S3Options::builder()
            .app_label(p(APP_LABEL))
            .aws_access_key_id(p(AWS_ACCESS_KEY_ID))
            .aws_secret_access_key(p(AWS_SECRET_ACCESS_KEY))
            .aws_bucket(p(AWS_BUCKET))
            .aws_region(p(AWS_REGION))
            .aws_credentials_secret(AWS_CREDENTIALS_SECRET)
            .build()
    }
}

impl Adapter for S3Adapter {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(AWS_ACCESS_KEY_ID)
                .with_display_name("AWS Access Key ID")
                .with_description("AWS Access Key ID to use in S3 Storage for assets."),
            Parameter::required(AWS_SECRET_ACCESS_KEY)
                .with_display_name("AWS Secret Access Key")
                .with_description("AWS Access Key Secret to use in S3 Storage for assets."),
            Parameter::required(AWS_BUCKET)
                .with_display_name("AWS S3 Bucket Name")
                .with_description("S3 Bucket Name to use in S3 Storage for assets."),
            Parameter::required(AWS_REGION)
                .with_display_name("AWS Region")
                .with_description("S3 Bucket Region to use in S3 Storage for assets."),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        Ok(S3::new(Self::options()?).objects())
    }

    fn capabilities(&self) -> Capabilities {
        s3::capabilities()
    }
}
