//! Parameterized deployment bundles and their emission as OpenShift templates.
//!
//! A [`Bundle`] is grown by the [`assembler`] adapter by adapter, rewritten by the
//! [`crate::transform`] chain and finally handed to one of two output boundaries:
//! [`Bundle::into_template`] for manifest emission or [`Bundle::process`] for a resolved list of
//! objects ready to be applied.
use std::{collections::BTreeMap, sync::LazyLock};

use indexmap::IndexMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::DynamicObject;
use rand::Rng;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, Snafu, ensure};

use crate::{
    component::Capabilities,
    object::{ObjectKey, ResourceObject},
};

pub mod adapters;
pub mod assembler;
pub mod variant;

pub const GENERATE_EXPRESSION: &str = "expression";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("the placeholder pattern is a valid regex")
});

static GENERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]\{([0-9]+)\}$").expect("the generator pattern is a valid regex")
});

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("parameter {name:?} is declared twice"))]
    DuplicateParameter { name: String },

    #[snafu(display("object {key} is generated twice"))]
    DuplicateObject { key: ObjectKey },

    #[snafu(display("required parameter {name:?} has no value, default or generator"))]
    MissingParameterValue { name: String },

    #[snafu(display("parameter {name:?} has an unsupported generator expression {expression:?}"))]
    InvalidGeneratorExpression { name: String, expression: String },

    #[snafu(display("failed to serialize object {key}"))]
    SerializeObject {
        source: serde_json::Error,
        key: ObjectKey,
    },

    #[snafu(display("failed to read processed object {key} back"))]
    DeserializeObject {
        source: serde_json::Error,
        key: ObjectKey,
    },
}

/// An externally visible knob of a bundle.
///
/// Objects reference a parameter by the textual placeholder `${NAME}`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<String>,

    /// Generator expression such as `[a-z0-9]{8}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default)]
    pub required: bool,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            ..Self::default()
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Generates the value from `expression` when none is supplied.
    pub fn generated(mut self, expression: impl Into<String>) -> Self {
        self.generate = Some(GENERATE_EXPRESSION.to_owned());
        self.from = Some(expression.into());
        self
    }

    /// The placeholder objects use to reference this parameter.
    pub fn placeholder(&self) -> String {
        placeholder(&self.name)
    }

    fn resolve<R: Rng>(&self, supplied: Option<&String>, rng: &mut R) -> Result<String> {
        if let Some(value) = supplied.or(self.value.as_ref()) {
            return Ok(value.clone());
        }

        if let (Some(GENERATE_EXPRESSION), Some(expression)) =
            (self.generate.as_deref(), self.from.as_deref())
        {
            return generate(&self.name, expression, rng);
        }

        ensure!(!self.required, MissingParameterValueSnafu { name: &self.name });
        Ok(String::new())
    }
}

/// The placeholder referencing the parameter `name`.
pub fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}

/// Expands a `[class]{length}` expression into a random string.
///
/// Classes are made of single characters and `a-z` style ranges.
fn generate<R: Rng>(name: &str, expression: &str, rng: &mut R) -> Result<String> {
    let invalid = || InvalidGeneratorExpressionSnafu {
        name,
        expression,
    };

    let captures = GENERATOR.captures(expression).with_context(invalid)?;
    let length: usize = captures[2].parse().ok().with_context(invalid)?;

    let class: Vec<char> = captures[1].chars().collect();
    let mut alphabet = Vec::new();
    let mut index = 0;
    while index < class.len() {
        if index + 2 < class.len() && class[index + 1] == '-' {
            let (start, end) = (class[index], class[index + 2]);
            ensure!(start <= end, invalid());
            alphabet.extend(start..=end);
            index += 3;
        } else {
            alphabet.push(class[index]);
            index += 1;
        }
    }
    ensure!(!alphabet.is_empty(), invalid());

    Ok((0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())])
        .collect())
}

/// The ordered parameters and objects an assembly produced, plus the capabilities their
/// components declared.
///
/// Both sequences keep insertion order. Removal preserves the relative order of what remains.
#[derive(Clone, Debug, Default)]
pub struct Bundle {
    parameters: IndexMap<String, Parameter>,
    objects: IndexMap<ObjectKey, ResourceObject>,
    capabilities: Capabilities,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters.get_mut(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ResourceObject> {
        self.objects.values()
    }

    /// Mutable access to every object.
    ///
    /// Callers must not change an object's kind, namespace or name.
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut ResourceObject> {
        self.objects.values_mut()
    }

    pub fn object(&self, key: &ObjectKey) -> Option<&ResourceObject> {
        self.objects.get(key)
    }

    pub fn object_mut(&mut self, key: &ObjectKey) -> Option<&mut ResourceObject> {
        self.objects.get_mut(key)
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn push_parameter(&mut self, parameter: Parameter) -> Result<()> {
        ensure!(
            !self.parameters.contains_key(&parameter.name),
            DuplicateParameterSnafu {
                name: parameter.name
            }
        );
        self.parameters.insert(parameter.name.clone(), parameter);
        Ok(())
    }

    pub fn push_object(&mut self, object: ResourceObject) -> Result<()> {
        let key = object.key();
        ensure!(
            !self.objects.contains_key(&key),
            DuplicateObjectSnafu { key }
        );
        self.objects.insert(key, object);
        Ok(())
    }

    /// Replaces the object with the same identity in place, or appends it.
    pub fn upsert_object(&mut self, object: ResourceObject) {
        self.objects.insert(object.key(), object);
    }

    pub fn remove_object(&mut self, key: &ObjectKey) -> Option<ResourceObject> {
        self.objects.shift_remove(key)
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<Parameter> {
        self.parameters.shift_remove(name)
    }

    pub fn merge_capabilities(&mut self, capabilities: Capabilities) {
        self.capabilities.merge(capabilities);
    }

    /// Renders the bundle as an OpenShift `Template` named `name`.
    pub fn into_template(self, name: &str, annotations: BTreeMap<String, String>) -> Template {
        Template {
            api_version: Template::API_VERSION.to_owned(),
            kind: Template::KIND.to_owned(),
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                annotations: (!annotations.is_empty()).then_some(annotations),
                ..ObjectMeta::default()
            },
            message: None,
            objects: self.objects.into_values().collect(),
            parameters: self.parameters.into_values().collect(),
        }
    }

    /// Resolves every parameter and substitutes it into the objects.
    ///
    /// A parameter takes the value in `values`, then its default, then a generated value.
    pub fn process(&self, values: &BTreeMap<String, String>) -> Result<Processed> {
        self.process_with_rng(values, &mut rand::rng())
    }

    pub fn process_with_rng<R: Rng>(
        &self,
        values: &BTreeMap<String, String>,
        rng: &mut R,
    ) -> Result<Processed> {
        let mut resolved = BTreeMap::new();
        for parameter in self.parameters.values() {
            let value = parameter.resolve(values.get(&parameter.name), rng)?;
            resolved.insert(parameter.name.clone(), value);
        }

        let objects = self
            .objects
            .iter()
            .map(|(key, object)| {
                let mut value = serde_json::to_value(object)
                    .with_context(|_| SerializeObjectSnafu { key: key.clone() })?;
                substitute(&mut value, &resolved);
                serde_json::from_value(value)
                    .with_context(|_| DeserializeObjectSnafu { key: key.clone() })
            })
            .collect::<Result<_>>()?;

        Ok(Processed {
            values: resolved,
            objects,
        })
    }
}

/// A bundle with every parameter resolved.
#[derive(Clone, Debug)]
pub struct Processed {
    pub values: BTreeMap<String, String>,
    pub objects: Vec<DynamicObject>,
}

/// Replaces every known placeholder inside the strings of `value`.
///
/// Placeholders of undeclared parameters are left untouched.
fn substitute(value: &mut serde_json::Value, resolved: &BTreeMap<String, String>) {
    match value {
        serde_json::Value::String(text) => {
            if PLACEHOLDER.is_match(text) {
                *text = PLACEHOLDER
                    .replace_all(text, |captures: &Captures| {
                        resolved
                            .get(&captures[1])
                            .cloned()
                            .unwrap_or_else(|| captures[0].to_owned())
                    })
                    .into_owned();
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                substitute(item, resolved);
            }
        }
        serde_json::Value::Object(fields) => {
            for field in fields.values_mut() {
                substitute(field, resolved);
            }
        }
        serde_json::Value::Null | serde_json::Value::Bool(_) | serde_json::Value::Number(_) => {}
    }
}

/// An OpenShift `template.openshift.io/v1` `Template`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub objects: Vec<ResourceObject>,
    pub parameters: Vec<Parameter>,
}

impl Template {
    pub const API_VERSION: &str = "template.openshift.io/v1";
    pub const KIND: &str = "Template";
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rstest::rstest;

    use super::*;
    use crate::{component::secret, labels::Labels, object::ObjectKind};

    fn bundle() -> Bundle {
        let mut bundle = Bundle::new();
        bundle
            .push_parameter(Parameter::required("APP_LABEL").with_value("3scale-api-management"))
            .expect("first declaration");
        bundle
            .push_parameter(Parameter::required("MYSQL_PASSWORD").generated("[a-z0-9]{8}"))
            .expect("first declaration");
        bundle
            .push_parameter(Parameter::optional("ADMIN_EMAIL"))
            .expect("first declaration");
        bundle
            .push_object(secret(
                "system-database",
                [("app".to_owned(), "${APP_LABEL}".to_owned())].into(),
                [
                    ("DB_PASSWORD", "${MYSQL_PASSWORD}".to_owned()),
                    ("ADMIN_EMAIL", "${ADMIN_EMAIL}".to_owned()),
                    ("UNDECLARED", "${NOT_A_PARAMETER}".to_owned()),
                ],
            ))
            .expect("first object");
        bundle
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut bundle = bundle();
        let parameter = bundle
            .push_parameter(Parameter::optional("APP_LABEL"))
            .expect_err("APP_LABEL is already declared");
        assert!(matches!(parameter, Error::DuplicateParameter { name } if name == "APP_LABEL"));

        let object = bundle
            .push_object(secret("system-database", Labels::new(), []))
            .expect_err("the secret is already generated");
        assert!(matches!(
            object,
            Error::DuplicateObject { key } if key == ObjectKey::template(ObjectKind::Secret, "system-database")
        ));
    }

    #[test]
    fn removal_keeps_order() {
        let mut bundle = bundle();
        bundle.remove_parameter("MYSQL_PASSWORD");
        let names: Vec<_> = bundle.parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["APP_LABEL", "ADMIN_EMAIL"]);
    }

    #[test]
    fn process_substitutes_values() {
        let processed = bundle()
            .process_with_rng(
                &[("ADMIN_EMAIL".to_owned(), "admin@example.com".to_owned())].into(),
                &mut StdRng::seed_from_u64(7),
            )
            .expect("every required parameter resolves");

        let password = &processed.values["MYSQL_PASSWORD"];
        assert_eq!(password.len(), 8);
        assert!(
            password
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );

        let object = &processed.objects[0];
        assert_eq!(
            object.metadata.labels.as_ref().and_then(|labels| labels.get("app")),
            Some(&"3scale-api-management".to_owned())
        );
        let data = &object.data["stringData"];
        assert_eq!(data["DB_PASSWORD"], password.as_str());
        assert_eq!(data["ADMIN_EMAIL"], "admin@example.com");
        assert_eq!(data["UNDECLARED"], "${NOT_A_PARAMETER}");
    }

    #[test]
    fn required_parameter_without_value_fails() {
        let mut bundle = Bundle::new();
        bundle
            .push_parameter(Parameter::required("WILDCARD_DOMAIN"))
            .expect("first declaration");

        let error = bundle
            .process(&BTreeMap::new())
            .expect_err("WILDCARD_DOMAIN has no value");
        assert!(matches!(error, Error::MissingParameterValue { name } if name == "WILDCARD_DOMAIN"));
    }

    #[rstest]
    #[case("[a-f0-9]{128}", 128, "abcdef0123456789")]
    #[case("[a-zA-Z0-9]{16}", 16, "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789")]
    #[case("[xyz]{4}", 4, "xyz")]
    fn generator_expressions(
        #[case] expression: &str,
        #[case] length: usize,
        #[case] alphabet: &str,
    ) {
        let value = generate("P", expression, &mut StdRng::seed_from_u64(1))
            .expect("expression is supported");
        assert_eq!(value.len(), length);
        assert!(value.chars().all(|c| alphabet.contains(c)));
    }

    #[rstest]
    #[case("[a-z0-9]")]
    #[case("{8}")]
    #[case("[z-a]{8}")]
    fn unsupported_generator_expressions(#[case] expression: &str) {
        generate("P", expression, &mut StdRng::seed_from_u64(1))
            .expect_err("expression is not supported");
    }
}
