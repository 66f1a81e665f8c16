use super::{APP_LABEL, p};
use crate::{
    component::{
        Capabilities, Component,
        zync::{self, Zync, ZyncOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const ZYNC_DATABASE_PASSWORD: &str = "ZYNC_DATABASE_PASSWORD";
pub const ZYNC_SECRET_KEY_BASE: &str = "ZYNC_SECRET_KEY_BASE";
pub const ZYNC_AUTHENTICATION_TOKEN: &str = "ZYNC_AUTHENTICATION_TOKEN";

const ZYNC_SECRET: &str = "[a-zA-Z0-9]{16}";

pub struct ZyncAdapter;

impl Adapter for ZyncAdapter {
    fn name(&self) -> &'static str {
        "zync"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(ZYNC_DATABASE_PASSWORD)
                .with_display_name("PostgreSQL Connection Password")
                .with_description("Password for the PostgreSQL connection user.")
                .generated(ZYNC_SECRET),
            Parameter::required(ZYNC_SECRET_KEY_BASE).generated(ZYNC_SECRET),
            Parameter::required(ZYNC_AUTHENTICATION_TOKEN).generated(ZYNC_SECRET),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = ZyncOptions::builder()
            .app_label(p(APP_LABEL))
            .authentication_token(p(ZYNC_AUTHENTICATION_TOKEN))
            .database_password(p(ZYNC_DATABASE_PASSWORD))
            .secret_key_base(p(ZYNC_SECRET_KEY_BASE))
            .build()?;
        Ok(Zync::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        zync::capabilities()
    }
}
