//! Read side of an informer cache, backed by the kube reflector store.

use std::sync::Arc;

use kube::runtime::reflector::{self, ObjectRef};
use kube::{Resource, ResourceExt};

/// Cache key of an object: `namespace/name`, or just `name` when cluster scoped.
pub fn object_key<K: Resource>(obj: &K) -> String {
    match obj.namespace() {
        Some(ns) if !ns.is_empty() => format!("{ns}/{}", obj.name_any()),
        _ => obj.name_any(),
    }
}

/// Read access to the objects an informer mirrors.
///
/// Cloning is cheap; every clone observes the same cache.
pub struct Store<K: Resource<DynamicType = ()> + 'static> {
    reader: reflector::Store<K>,
}

impl<K> Clone for Store<K>
where
    K: Resource<DynamicType = ()> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}

impl<K> Store<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    pub(crate) fn new(reader: reflector::Store<K>) -> Self {
        Self { reader }
    }

    /// The underlying reflector store.
    pub fn reader(&self) -> reflector::Store<K> {
        self.reader.clone()
    }

    pub fn get(&self, obj_ref: &ObjectRef<K>) -> Option<Arc<K>> {
        self.reader.get(obj_ref)
    }

    /// All cached objects, ordered by key.
    pub fn list(&self) -> Vec<Arc<K>> {
        let mut items = self.reader.state();
        items.sort_by_cached_key(|obj| object_key(obj.as_ref()));
        items
    }

    pub fn keys(&self) -> Vec<String> {
        self.list().iter().map(|obj| object_key(obj.as_ref())).collect()
    }

    /// Cached objects living in `namespace`.
    pub fn list_namespace(&self, namespace: &str) -> Vec<Arc<K>> {
        self.list()
            .into_iter()
            .filter(|obj| obj.namespace().as_deref() == Some(namespace))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Namespace;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::runtime::watcher;

    use super::*;
    use crate::informer::testing::pod;

    #[test]
    fn keys_namespaced_and_cluster_scoped_objects() {
        assert_eq!(object_key(&pod("default", "web-0", "1")), "default/web-0");

        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some("kube-system".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(object_key(&ns), "kube-system");
    }

    #[test]
    fn lists_by_namespace_without_prefix_collisions() {
        let (reader, mut writer) = reflector::store();
        for p in [
            pod("app", "b", "1"),
            pod("app", "a", "1"),
            pod("app-2", "c", "1"),
            pod("other", "d", "1"),
        ] {
            writer.apply_watcher_event(&watcher::Event::Apply(p));
        }
        let store = Store::new(reader);

        let names: Vec<_> = store
            .list_namespace("app")
            .iter()
            .map(|p| p.name_any())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.len(), 4);
        assert_eq!(store.keys(), vec!["app-2/c", "app/a", "app/b", "other/d"]);
        assert!(store.get(&ObjectRef::new("d").within("other")).is_some());
        assert!(store.get(&ObjectRef::new("a").within("other")).is_none());
    }
}
