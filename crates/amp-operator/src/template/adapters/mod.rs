//! Template adapters, one per component.
//!
//! Each adapter feeds its component `${PARAMETER}` placeholders instead of concrete values and
//! declares the parameters those placeholders refer to.
pub mod apicast;
pub mod backend;
pub mod global;
pub mod high_availability;
pub mod images;
pub mod memcached;
pub mod mysql;
pub mod redis;
pub mod s3;
pub mod system;
pub mod wildcard_router;
pub mod zync;

pub use apicast::ApicastAdapter;
pub use backend::BackendAdapter;
pub use global::GlobalAdapter;
pub use high_availability::HighAvailabilityAdapter;
pub use images::ImagesAdapter;
pub use memcached::MemcachedAdapter;
pub use mysql::MysqlAdapter;
pub use redis::RedisAdapter;
pub use s3::S3Adapter;
pub use system::SystemAdapter;
pub use wildcard_router::WildcardRouterAdapter;
pub use zync::ZyncAdapter;

pub const APP_LABEL: &str = "APP_LABEL";
pub const AMP_RELEASE: &str = "AMP_RELEASE";
pub const TENANT_NAME: &str = "TENANT_NAME";
pub const WILDCARD_DOMAIN: &str = "WILDCARD_DOMAIN";
pub const RWX_STORAGE_CLASS: &str = "RWX_STORAGE_CLASS";

/// Expression of the generated passwords and tokens.
const GENERATED_SECRET: &str = "[a-z0-9]{8}";

/// Shorthand for [`super::placeholder`].
fn p(name: &str) -> String {
    super::placeholder(name)
}
