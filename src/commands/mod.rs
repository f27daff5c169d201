pub mod list;
pub mod watch;

use std::time::Duration;

use kube::Client;
use podwatch::informer::SharedInformerFactory;

/// Which pods the informers mirror.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

impl Scope {
    pub fn factory(&self, client: Client, resync: Duration) -> SharedInformerFactory {
        SharedInformerFactory::new(client, resync)
            .namespace(self.namespace.clone())
            .label_selector(self.label_selector.clone())
            .field_selector(self.field_selector.clone())
    }
}
