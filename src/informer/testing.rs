//! Fixtures shared by the informer tests.

use std::sync::{Arc, Mutex};

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use super::handler::HandlerFuncs;

pub(crate) fn pod(namespace: &str, name: &str, version: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some(version.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn ident(p: &Pod) -> String {
    format!(
        "{}/{}@{}",
        p.namespace().unwrap_or_default(),
        p.name_any(),
        p.resource_version().unwrap_or_default()
    )
}

/// A handler that records every callback as a line of text.
pub(crate) fn recorder() -> (HandlerFuncs<Pod>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (a, u, d) = (seen.clone(), seen.clone(), seen.clone());
    let funcs = HandlerFuncs::<Pod>::new()
        .on_add(move |p, initial| {
            a.lock().unwrap().push(format!("add {} initial={initial}", ident(p)));
        })
        .on_update(move |old, new| {
            u.lock().unwrap().push(format!("update {} -> {}", ident(old), ident(new)));
        })
        .on_delete(move |deleted| {
            let kind = if deleted.is_final_state_unknown() { "unknown" } else { "known" };
            d.lock().unwrap().push(format!("delete {} {kind}", ident(deleted.object())));
        });
    (funcs, seen)
}
