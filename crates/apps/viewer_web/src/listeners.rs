use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

/// Where listeners are registered. `EventTarget` in the browser.
pub trait ListenerTarget: Clone {
    type Callback;
    type Error;

    fn add(&self, kind: &'static str, callback: &Self::Callback, passive: bool) -> Result<(), Self::Error>;
    fn remove(&self, kind: &'static str, callback: &Self::Callback);
}

impl ListenerTarget for EventTarget {
    type Callback = Closure<dyn FnMut(Event)>;
    type Error = JsValue;

    fn add(&self, kind: &'static str, callback: &Self::Callback, passive: bool) -> Result<(), JsValue> {
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        self.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )
    }

    fn remove(&self, kind: &'static str, callback: &Self::Callback) {
        let _ = self.remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref());
    }
}

struct Listener<T: ListenerTarget> {
    target: T,
    kind: &'static str,
    callback: T::Callback,
}

/// Every DOM listener the viewer installs, so unmount can remove all of them.
pub struct ListenerSet<T: ListenerTarget = EventTarget> {
    entries: Vec<Listener<T>>,
}

impl<T: ListenerTarget> Default for ListenerSet<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: ListenerTarget> ListenerSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` and keep it alive until it is detached.
    pub fn insert(
        &mut self,
        target: &T,
        kind: &'static str,
        passive: bool,
        callback: T::Callback,
    ) -> Result<(), T::Error> {
        target.add(kind, &callback, passive)?;
        self.entries.push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every listener. Returns how many were detached.
    pub fn detach_all(&mut self) -> usize {
        let count = self.entries.len();
        for listener in self.entries.drain(..) {
            listener.target.remove(listener.kind, &listener.callback);
        }
        count
    }
}

impl ListenerSet<EventTarget> {
    /// Listen for `kind` on `target`. Events that are not an `E` are dropped.
    ///
    /// `passive: false` is needed for handlers that call `preventDefault`.
    pub fn listen<E, F>(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        mut handler: F,
    ) -> Result<(), JsValue>
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        });
        self.insert(target, kind, passive, callback)
    }
}

impl<T: ListenerTarget> Drop for ListenerSet<T> {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::{ListenerSet, ListenerTarget};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Add(&'static str, u32, bool),
        Remove(&'static str, u32),
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
        refuse: Option<&'static str>,
    }

    impl Recorder {
        fn removed(&self) -> Vec<(&'static str, u32)> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match *c {
                    Call::Remove(kind, cb) => Some((kind, cb)),
                    Call::Add(..) => None,
                })
                .collect()
        }
    }

    impl ListenerTarget for Recorder {
        type Callback = u32;
        type Error = String;

        fn add(&self, kind: &'static str, callback: &u32, passive: bool) -> Result<(), String> {
            if self.refuse == Some(kind) {
                return Err(format!("{kind} refused"));
            }
            self.calls.borrow_mut().push(Call::Add(kind, *callback, passive));
            Ok(())
        }

        fn remove(&self, kind: &'static str, callback: &u32) {
            self.calls.borrow_mut().push(Call::Remove(kind, *callback));
        }
    }

    fn wired(target: &Recorder) -> ListenerSet<Recorder> {
        let mut set = ListenerSet::new();
        set.insert(target, "mousedown", true, 1).unwrap();
        set.insert(target, "wheel", false, 2).unwrap();
        set.insert(target, "keydown", false, 3).unwrap();
        set
    }

    #[test]
    fn detach_all_removes_every_listener_it_added() {
        let target = Recorder::default();
        let mut set = wired(&target);
        assert_eq!(set.len(), 3);

        assert_eq!(set.detach_all(), 3);
        assert!(set.is_empty());
        assert_eq!(target.removed(), vec![("mousedown", 1), ("wheel", 2), ("keydown", 3)]);

        assert_eq!(set.detach_all(), 0);
        assert_eq!(target.removed().len(), 3);
    }

    #[test]
    fn dropping_the_set_detaches() {
        let target = Recorder::default();
        drop(wired(&target));
        assert_eq!(target.removed().len(), 3);
    }

    #[test]
    fn refused_listener_is_not_tracked() {
        let target = Recorder {
            refuse: Some("wheel"),
            ..Recorder::default()
        };
        let mut set = ListenerSet::new();
        set.insert(&target, "mousedown", true, 1).unwrap();
        assert!(set.insert(&target, "wheel", false, 2).is_err());
        assert_eq!(set.len(), 1);
        assert_eq!(set.detach_all(), 1);
        assert_eq!(target.removed(), vec![("mousedown", 1)]);
    }
}
