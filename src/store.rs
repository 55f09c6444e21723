use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::action::Action;
use crate::action_mapper::ActionMapper;
use crate::action_sender::{ActionSender, AnyActionSender};
use crate::builder::{StoreBuilder, DEFAULT_NAME, DEFAULT_OBSERVER_CAPACITY};
use crate::change_observer::{ChangeNotifier, ChangeObserver};
use crate::error::StoreError;
use crate::listener::{Listeners, Unsubscribe};
use crate::reducer::Reducer;

/// A dispatch that starts while another one is running on the same store,
/// from any thread, fails with [`StoreError::Reentrant`] instead of waiting.
pub struct Store<State, A> {
    inner: Arc<StoreInner<State, A>>,
}

struct StoreInner<State, A> {
    name: Arc<str>,
    state: Mutex<Arc<State>>,
    reducer: RwLock<Arc<dyn Reducer<State, A>>>,
    listeners: Arc<Listeners>,
    changes: ChangeNotifier,
    dispatching: AtomicBool,
}

impl<State, A> Store<State, A>
where
    State: Send + Sync + 'static,
    A: Action,
{
    pub fn new(reducer: impl Reducer<State, A> + 'static) -> Result<Self, StoreError> {
        StoreBuilder::new(reducer).build()
    }

    pub fn with_state(reducer: impl Reducer<State, A> + 'static, state: State) -> Self {
        Self::from_parts(
            DEFAULT_NAME.into(),
            Arc::new(reducer),
            Arc::new(state),
            DEFAULT_OBSERVER_CAPACITY,
        )
    }

    pub fn builder(reducer: impl Reducer<State, A> + 'static) -> StoreBuilder<State, A> {
        StoreBuilder::new(reducer)
    }

    pub(crate) fn from_parts(
        name: Arc<str>,
        reducer: Arc<dyn Reducer<State, A>>,
        state: Arc<State>,
        observer_capacity: usize,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name,
                state: Mutex::new(state),
                reducer: RwLock::new(reducer),
                listeners: Arc::new(Listeners::default()),
                changes: ChangeNotifier::new(observer_capacity),
                dispatching: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> Arc<State> {
        self.inner.state.lock().clone()
    }

    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.load(Ordering::Acquire)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Nothing is committed when the reducer fails. Observers from
    /// [`ChangeObserver::observe`] are pinged before listeners run, so a
    /// panicking listener still leaves them notified; the listeners after it
    /// in the pass are skipped and the store is idle again.
    pub fn dispatch(&self, action: A) -> Result<A, StoreError> {
        if action.action_type().is_empty() {
            log::warn!("[{}] rejected action without type: {:?}", self.inner.name, action);
            return Err(StoreError::MissingActionType);
        }
        let guard = self.begin(&action)?;
        let reducer = self.inner.reducer.read().clone();
        let next = self.run_reducer(&guard, reducer.as_ref(), &action)?;
        self.publish(&guard, next, &action);
        Ok(action)
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Unsubscribe {
        let id = self.inner.listeners.add(Arc::new(listener));
        log::debug!("[{}] listener {} subscribed", self.inner.name, id);
        Unsubscribe::new(&self.inner.listeners, id, self.inner.name.clone())
    }

    /// Swaps the root reducer and runs the init action through it.
    ///
    /// On any error the previous reducer stays installed.
    pub fn replace_reducer(
        &self,
        reducer: impl Reducer<State, A> + 'static,
    ) -> Result<(), StoreError> {
        let init = A::init();
        let guard = self.begin(&init)?;
        let reducer: Arc<dyn Reducer<State, A>> = Arc::new(reducer);
        let next = self.run_reducer(&guard, reducer.as_ref(), &init)?;
        *self.inner.reducer.write() = reducer;
        log::debug!("[{}] reducer replaced", self.inner.name);
        self.publish(&guard, next, &init);
        Ok(())
    }

    fn begin(&self, action: &A) -> Result<DispatchGuard<'_>, StoreError> {
        DispatchGuard::acquire(&self.inner.dispatching).ok_or_else(|| {
            log::warn!(
                "[{}] rejected `{}`: dispatch already in progress",
                self.inner.name,
                action.action_type()
            );
            StoreError::Reentrant {
                action_type: action.action_type().to_string(),
            }
        })
    }

    fn run_reducer(
        &self,
        _guard: &DispatchGuard<'_>,
        reducer: &dyn Reducer<State, A>,
        action: &A,
    ) -> Result<Arc<State>, StoreError> {
        reducer
            .reduce(Some(&self.state()), action)
            .map_err(|source| StoreError::Reducer {
                action_type: action.action_type().to_string(),
                source,
            })
    }

    fn publish(&self, _guard: &DispatchGuard<'_>, next: Arc<State>, action: &A) {
        let inner = &*self.inner;
        let current = std::mem::replace(&mut *inner.state.lock(), next.clone());
        if Arc::ptr_eq(&current, &next) {
            log::trace!("[{}] `{}` left state unchanged", inner.name, action.action_type());
        } else {
            log::debug!("[{}] handled {:?}", inner.name, action);
        }

        inner.changes.notify();
        inner.listeners.notify();
    }

    pub fn scope<ChildAction>(
        &self,
        map: impl Fn(ChildAction) -> A + Send + Sync + 'static,
    ) -> AnyActionSender<ChildAction>
    where
        ChildAction: Send + 'static,
    {
        let parent = AnyActionSender::new(self.clone());
        AnyActionSender::new(ActionMapper::new(parent, map))
    }
}

impl<State, A> Clone for Store<State, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<State, A> ActionSender for Store<State, A>
where
    State: Send + Sync + 'static,
    A: Action,
{
    type SendableAction = A;

    fn send(&self, action: A) -> Result<(), StoreError> {
        self.dispatch(action).map(|_| ())
    }
}

impl<State, A> ChangeObserver for Store<State, A> {
    fn observe(&self) -> broadcast::Receiver<()> {
        self.inner.changes.subscribe()
    }
}

impl<State, A> std::fmt::Debug for Store<State, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("listeners", &self.inner.listeners.len())
            .field(
                "dispatching",
                &self.inner.dispatching.load(Ordering::Relaxed),
            )
            .finish()
    }
}

struct DispatchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> DispatchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
