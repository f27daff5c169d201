//! Shared informers: a local cache of watched objects plus change callbacks.

mod factory;
mod handler;
mod processor;
mod shared;
mod store;
#[cfg(test)]
mod testing;

pub use factory::{DEFAULT_RESYNC, SharedInformerFactory};
pub use handler::{DeletedObject, HandlerFuncs, Notification, ResourceEventHandler};
pub use shared::SharedInformer;
pub use store::{Store, object_key};
