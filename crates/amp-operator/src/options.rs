//! Staged construction of component configuration.
//!
//! Every component is configured through a pair of types generated by [`define_options!`]:
//! a mutable `<Name>OptionsBuilder` draft whose fields are all optional, and the immutable,
//! validated `<Name>Options` record the component consumes. Validation and defaulting only
//! happen in `build()`.
use snafu::{OptionExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("{options}: required field {field:?} is not set"))]
    MissingRequiredField {
        options: &'static str,
        field: &'static str,
    },
}

/// Decides whether a supplied value counts as set. Empty strings are treated like absent ones.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for i32 {
    fn is_present(&self) -> bool {
        true
    }
}

impl Presence for bool {
    fn is_present(&self) -> bool {
        true
    }
}

#[doc(hidden)]
pub fn required<T: Presence>(
    value: Option<&T>,
    options: &'static str,
    field: &'static str,
) -> Result<T>
where
    T: Clone,
{
    value
        .filter(|value| value.is_present())
        .cloned()
        .context(MissingRequiredFieldSnafu { options, field })
}

/// Generates an options builder and its validated options record.
///
/// ```ignore
/// define_options! {
///     /// Configuration of the wildcard router.
///     WildcardRouterOptions, WildcardRouterOptionsBuilder {
///         required { app_label: String, wildcard_domain: String }
///         optional { wildcard_policy: String = "None" }
///         omittable { }
///     }
/// }
/// ```
///
/// * `required` fields must be set (and non-empty) before `build()` succeeds.
/// * `optional` fields take the given default in `build()` when unset.
/// * `omittable` fields stay `None` when unset.
macro_rules! define_options {
    (
        $(#[$meta:meta])*
        $options:ident, $builder:ident {
            required { $($req:ident : $req_ty:ty),* $(,)? }
            optional { $($opt:ident : $opt_ty:ty = $default:expr),* $(,)? }
            omittable { $($omit:ident : $omit_ty:ty),* $(,)? }
        }
    ) => {
        #[derive(Clone, Debug, Default)]
        pub struct $builder {
            $($req: Option<$req_ty>,)*
            $($opt: Option<$opt_ty>,)*
            $($omit: Option<$omit_ty>,)*
        }

        impl $builder {
            pub fn new() -> Self {
                Self::default()
            }

            $(
                pub fn $req(&mut self, value: impl Into<$req_ty>) -> &mut Self {
                    self.$req = Some(value.into());
                    self
                }
            )*

            $(
                pub fn $opt(&mut self, value: impl Into<$opt_ty>) -> &mut Self {
                    self.$opt = Some(value.into());
                    self
                }
            )*

            $(
                pub fn $omit(&mut self, value: impl Into<$omit_ty>) -> &mut Self {
                    self.$omit = Some(value.into());
                    self
                }
            )*

            pub fn build(&self) -> Result<$options, $crate::options::Error> {
                Ok($options {
                    $($req: $crate::options::required(
                        self.$req.as_ref(),
                        stringify!($options),
                        stringify!($req),
                    )?,)*
                    $($opt: self.$opt.clone().unwrap_or_else(|| $default.into()),)*
                    $($omit: self.$omit.clone(),)*
                })
            }
        }

        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $options {
            $($req: $req_ty,)*
            $($opt: $opt_ty,)*
            $($omit: Option<$omit_ty>,)*
        }

        impl $options {
            pub fn builder() -> $builder {
                $builder::new()
            }

            $(
                pub fn $req(&self) -> &$req_ty {
                    &self.$req
                }
            )*

            $(
                pub fn $opt(&self) -> &$opt_ty {
                    &self.$opt
                }
            )*

            $(
                pub fn $omit(&self) -> Option<&$omit_ty> {
                    self.$omit.as_ref()
                }
            )*
        }
    };
}

pub(crate) use define_options;

#[cfg(test)]
mod tests {
    use super::*;

    define_options! {
        ExampleOptions, ExampleOptionsBuilder {
            required { app_label: String, tenant_name: String }
            optional { replicas: i32 = 1, policy: String = "None" }
            omittable { storage_class_name: String }
        }
    }

    #[test]
    fn defaults_apply_at_build_time() {
        let mut builder = ExampleOptions::builder();
        builder.app_label("3scale-api-management").tenant_name("3scale");

        let options = builder.build().expect("all required fields are set");

        assert_eq!(options.replicas(), &1);
        assert_eq!(options.policy(), "None");
        assert_eq!(options.storage_class_name(), None);
    }

    #[test]
    fn set_values_override_defaults() {
        let options = ExampleOptions::builder()
            .app_label("amp")
            .tenant_name("acme")
            .replicas(3)
            .storage_class_name("gp2")
            .build()
            .expect("all required fields are set");

        assert_eq!(options.replicas(), &3);
        assert_eq!(options.storage_class_name().map(String::as_str), Some("gp2"));
    }

    #[test]
    fn missing_field_is_named() {
        let error = ExampleOptions::builder()
            .app_label("amp")
            .build()
            .expect_err("tenant_name is missing");

        assert_eq!(
            error,
            Error::MissingRequiredField {
                options: "ExampleOptions",
                field: "tenant_name",
            }
        );
        assert_eq!(
            error.to_string(),
            "ExampleOptions: required field \"tenant_name\" is not set"
        );
    }

    #[test]
    fn empty_string_is_missing() {
        let error = ExampleOptions::builder()
            .app_label("")
            .tenant_name("acme")
            .build()
            .expect_err("app_label is empty");

        assert_eq!(
            error,
            Error::MissingRequiredField {
                options: "ExampleOptions",
                field: "app_label",
            }
        );
    }
}
