use super::{AMP_RELEASE, APP_LABEL, TENANT_NAME};
use crate::{
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

/// Parameters shared by every component. Generates no objects.
pub struct GlobalAdapter;

impl Adapter for GlobalAdapter {
    fn name(&self) -> &'static str {
        "global"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(AMP_RELEASE)
                .with_description("AMP release tag.")
                .with_value("2.5.0"),
            Parameter::required(APP_LABEL)
                .with_description("Used for object app labels")
                .with_value("3scale-api-management"),
            Parameter::required(TENANT_NAME)
                .with_description("Tenant name under the root that Admin UI will be available with -admin suffix.")
                .with_value("3scale"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        Ok(Vec::new())
    }
}
