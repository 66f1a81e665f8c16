use super::{
    AMP_RELEASE, APP_LABEL, GENERATED_SECRET, RWX_STORAGE_CLASS, TENANT_NAME, WILDCARD_DOMAIN, p,
};
use crate::{
    component::{
        Capabilities, Component,
        system::{self, System, SystemOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const SYSTEM_BACKEND_USERNAME: &str = "SYSTEM_BACKEND_USERNAME";
pub const SYSTEM_BACKEND_PASSWORD: &str = "SYSTEM_BACKEND_PASSWORD";
pub const SYSTEM_BACKEND_SHARED_SECRET: &str = "SYSTEM_BACKEND_SHARED_SECRET";
pub const SYSTEM_APP_SECRET_KEY_BASE: &str = "SYSTEM_APP_SECRET_KEY_BASE";
pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub const ADMIN_USERNAME: &str = "ADMIN_USERNAME";
pub const ADMIN_EMAIL: &str = "ADMIN_EMAIL";
pub const ADMIN_ACCESS_TOKEN: &str = "ADMIN_ACCESS_TOKEN";
pub const MASTER_NAME: &str = "MASTER_NAME";
pub const MASTER_USER: &str = "MASTER_USER";
pub const MASTER_PASSWORD: &str = "MASTER_PASSWORD";
pub const MASTER_ACCESS_TOKEN: &str = "MASTER_ACCESS_TOKEN";
pub const RECAPTCHA_PUBLIC_KEY: &str = "RECAPTCHA_PUBLIC_KEY";
pub const RECAPTCHA_PRIVATE_KEY: &str = "RECAPTCHA_PRIVATE_KEY";

pub struct SystemAdapter;

impl Adapter for SystemAdapter {
    fn name(&self) -> &'static str {
        "system"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(SYSTEM_BACKEND_USERNAME)
                .with_description("Internal 3scale API username for internal 3scale api auth.")
                .with_value("3scale_api_user"),
            Parameter::required(SYSTEM_BACKEND_PASSWORD)
                .with_description("Internal 3scale API password for internal 3scale api auth.")
                .generated(GENERATED_SECRET),
            Parameter::required(SYSTEM_BACKEND_SHARED_SECRET)
                .with_description("Shared secret to import events from backend to system.")
                .generated(GENERATED_SECRET),
            Parameter::required(SYSTEM_APP_SECRET_KEY_BASE)
                .with_description("System application secret key base")
                .generated("[a-f0-9]{128}"),
            Parameter::required(ADMIN_PASSWORD).generated(GENERATED_SECRET),
            Parameter::required(ADMIN_USERNAME).with_value("admin"),
            Parameter::optional(ADMIN_EMAIL),
            Parameter::optional(ADMIN_ACCESS_TOKEN)
                .with_description(
                    "Admin Access Token with all scopes and write permissions for API access.",
                )
                .generated("[a-z0-9]{16}"),
            Parameter::required(MASTER_NAME)
                .with_description("The root name which Master Admin UI will be available at.")
                .with_value("master"),
            Parameter::required(MASTER_USER).with_value("master"),
            Parameter::required(MASTER_PASSWORD).generated(GENERATED_SECRET),
            Parameter::required(MASTER_ACCESS_TOKEN).generated(GENERATED_SECRET),
            Parameter::optional(RECAPTCHA_PUBLIC_KEY)
                .with_description("reCAPTCHA site key (used in spam protection)"),
            Parameter::optional(RECAPTCHA_PRIVATE_KEY)
                .with_description("reCAPTCHA secret key (used in spam protection)"),
            Parameter::optional(RWX_STORAGE_CLASS)
                .with_description("The Storage Class to be used by ReadWriteMany PVCs"),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = SystemOptions::builder()
            .app_label(p(APP_LABEL))
            .amp_release(p(AMP_RELEASE))
            .admin_access_token(p(ADMIN_ACCESS_TOKEN))
            .admin_password(p(ADMIN_PASSWORD))
            .admin_username(p(ADMIN_USERNAME))
            .admin_email(p(ADMIN_EMAIL))
            .apicast_access_token(p(super::apicast::APICAST_ACCESS_TOKEN))
            .apicast_registry_url(p(super::apicast::APICAST_REGISTRY_URL))
            .master_access_token(p(MASTER_ACCESS_TOKEN))
            .master_name(p(MASTER_NAME))
            .master_username(p(MASTER_USER))
            .master_password(p(MASTER_PASSWORD))
            .recaptcha_public_key(p(RECAPTCHA_PUBLIC_KEY))
            .recaptcha_private_key(p(RECAPTCHA_PRIVATE_KEY))
            .app_secret_key_base(p(SYSTEM_APP_SECRET_KEY_BASE))
            .backend_shared_secret(p(SYSTEM_BACKEND_SHARED_SECRET))
            .tenant_name(p(TENANT_NAME))
            .wildcard_domain(p(WILDCARD_DOMAIN))
            .storage_class_name(p(RWX_STORAGE_CLASS))
            .build()?;
        Ok(System::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = system::capabilities();
        for storage in &mut capabilities.shared_storage {
            if storage.claim == system::STORAGE {
                storage.parameter = Some(RWX_STORAGE_CLASS.to_owned());
            }
        }
        capabilities
    }
}
