//! Label keys and label sets shared by every generated object.
//!
//! Every object carries the application label ([`APP_KEY`]) and the component role label
//! ([`COMPONENT_KEY`]). Workload pod templates additionally carry [`DEPLOYMENT_CONFIG_KEY`]
//! which is the only label Services select on.

use std::collections::BTreeMap;

pub const APP_KEY: &str = "app";
pub const COMPONENT_KEY: &str = "threescale_component";
pub const COMPONENT_ELEMENT_KEY: &str = "threescale_component_element";
pub const DEPLOYMENT_CONFIG_KEY: &str = "deploymentConfig";

pub type Labels = BTreeMap<String, String>;

/// Common sets of labels that apply for different use-cases.
pub mod sets {
    use super::{APP_KEY, COMPONENT_ELEMENT_KEY, COMPONENT_KEY, DEPLOYMENT_CONFIG_KEY, Labels};

    /// Returns the application and component role labels.
    pub fn component(app: &str, component: &str) -> Labels {
        Labels::from([
            (APP_KEY.to_owned(), app.to_owned()),
            (COMPONENT_KEY.to_owned(), component.to_owned()),
        ])
    }

    /// Returns the [`component`] labels plus the element label, used when a component
    /// consists of several workloads.
    pub fn element(app: &str, component: &str, element: &str) -> Labels {
        let mut labels = self::component(app, component);
        labels.insert(COMPONENT_ELEMENT_KEY.to_owned(), element.to_owned());
        labels
    }

    /// Returns the label set a Service uses to select the pods of `workload`.
    pub fn workload_selector(workload: &str) -> Labels {
        Labels::from([(DEPLOYMENT_CONFIG_KEY.to_owned(), workload.to_owned())])
    }

    /// Returns the labels of a workload's pod template: the object labels plus the
    /// [`workload_selector`].
    pub fn pod(object_labels: &Labels, workload: &str) -> Labels {
        let mut labels = object_labels.clone();
        labels.extend(workload_selector(workload));
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_labels_contain_selector() {
        let object_labels = sets::element("${APP_LABEL}", "backend", "listener");
        let pod = sets::pod(&object_labels, "backend-listener");

        for (key, value) in sets::workload_selector("backend-listener") {
            assert_eq!(pod.get(&key), Some(&value));
        }
        assert_eq!(pod.get(APP_KEY).map(String::as_str), Some("${APP_LABEL}"));
        assert_eq!(pod.get(COMPONENT_KEY).map(String::as_str), Some("backend"));
        assert_eq!(
            pod.get(COMPONENT_ELEMENT_KEY).map(String::as_str),
            Some("listener")
        );
    }
}
