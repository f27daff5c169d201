use std::sync::Arc;

/// A change observed by an informer, delivered to every registered handler.
#[derive(Debug)]
pub enum Notification<K> {
    Added { obj: Arc<K>, initial: bool },
    Updated { old: Arc<K>, new: Arc<K> },
    Deleted(DeletedObject<K>),
}

impl<K> Clone for Notification<K> {
    fn clone(&self) -> Self {
        match self {
            Self::Added { obj, initial } => Self::Added {
                obj: obj.clone(),
                initial: *initial,
            },
            Self::Updated { old, new } => Self::Updated {
                old: old.clone(),
                new: new.clone(),
            },
            Self::Deleted(deleted) => Self::Deleted(deleted.clone()),
        }
    }
}

/// The object handed to a delete callback.
#[derive(Debug)]
pub enum DeletedObject<K> {
    /// The watch reported the deletion.
    Known(Arc<K>),
    /// The object vanished between two lists; `last_known` is the cached copy
    /// and may be stale.
    FinalStateUnknown { key: String, last_known: Arc<K> },
}

impl<K> Clone for DeletedObject<K> {
    fn clone(&self) -> Self {
        match self {
            Self::Known(obj) => Self::Known(obj.clone()),
            Self::FinalStateUnknown { key, last_known } => Self::FinalStateUnknown {
                key: key.clone(),
                last_known: last_known.clone(),
            },
        }
    }
}

impl<K> DeletedObject<K> {
    /// The last state of the deleted object seen by this process.
    pub fn object(&self) -> &K {
        match self {
            Self::Known(obj) => obj,
            Self::FinalStateUnknown { last_known, .. } => last_known,
        }
    }

    pub fn is_final_state_unknown(&self) -> bool {
        matches!(self, Self::FinalStateUnknown { .. })
    }
}

/// Callbacks invoked by an informer for each change to its cache.
///
/// Every handler runs on its own task and sees notifications in cache order.
pub trait ResourceEventHandler<K>: Send + 'static {
    fn on_add(&mut self, obj: &K, is_initial_list: bool);
    fn on_update(&mut self, old: &K, new: &K);
    fn on_delete(&mut self, obj: &DeletedObject<K>);

    fn handle(&mut self, notification: &Notification<K>) {
        match notification {
            Notification::Added { obj, initial } => self.on_add(obj, *initial),
            Notification::Updated { old, new } => self.on_update(old, new),
            Notification::Deleted(deleted) => self.on_delete(deleted),
        }
    }
}

type AddFn<K> = Box<dyn FnMut(&K, bool) + Send>;
type UpdateFn<K> = Box<dyn FnMut(&K, &K) + Send>;
type DeleteFn<K> = Box<dyn FnMut(&DeletedObject<K>) + Send>;

/// Closure based handler; unset callbacks ignore their notifications.
pub struct HandlerFuncs<K> {
    add: Option<AddFn<K>>,
    update: Option<UpdateFn<K>>,
    delete: Option<DeleteFn<K>>,
}

impl<K> Default for HandlerFuncs<K> {
    fn default() -> Self {
        Self {
            add: None,
            update: None,
            delete: None,
        }
    }
}

impl<K> HandlerFuncs<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_add(mut self, f: impl FnMut(&K, bool) + Send + 'static) -> Self {
        self.add = Some(Box::new(f));
        self
    }

    pub fn on_update(mut self, f: impl FnMut(&K, &K) + Send + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl FnMut(&DeletedObject<K>) + Send + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }
}

impl<K: 'static> ResourceEventHandler<K> for HandlerFuncs<K> {
    fn on_add(&mut self, obj: &K, is_initial_list: bool) {
        if let Some(f) = self.add.as_mut() {
            f(obj, is_initial_list);
        }
    }

    fn on_update(&mut self, old: &K, new: &K) {
        if let Some(f) = self.update.as_mut() {
            f(old, new);
        }
    }

    fn on_delete(&mut self, obj: &DeletedObject<K>) {
        if let Some(f) = self.delete.as_mut() {
            f(obj);
        }
    }
}
