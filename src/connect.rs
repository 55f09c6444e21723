use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::Action;
use crate::action_sender::AnyActionSender;
use crate::listener::Unsubscribe;
use crate::store::Store;

type Refresh = Arc<dyn Fn() + Send + Sync>;

/// View model bound to a store: props derived from state (and the view's own
/// props) plus handlers that dispatch into it.
///
/// Props are re-derived after every dispatch but replaced, with `version`
/// bumped, only when they differ. Dropping the `Connected` unsubscribes it.
pub struct Connected<Props, Handlers, OwnProps = ()> {
    props: Arc<Mutex<Arc<Props>>>,
    own_props: Arc<Mutex<Arc<OwnProps>>>,
    version: Arc<AtomicU64>,
    handlers: Handlers,
    refresh: Option<Refresh>,
    subscription: Option<Unsubscribe>,
}

impl<Props, Handlers> Connected<Props, Handlers>
where
    Props: PartialEq + Send + Sync + 'static,
{
    pub fn new<State, A>(
        store: &Store<State, A>,
        map_state_to_props: impl Fn(&State) -> Props + Send + Sync + 'static,
        map_dispatch_to_props: impl FnOnce(AnyActionSender<A>) -> Handlers,
    ) -> Self
    where
        State: Send + Sync + 'static,
        A: Action,
    {
        Self::with_own_props(
            store,
            (),
            move |state: &State, _: &()| map_state_to_props(state),
            move |sender: AnyActionSender<A>, _: &()| map_dispatch_to_props(sender),
        )
    }
}

impl<Props, Handlers, OwnProps> Connected<Props, Handlers, OwnProps>
where
    Props: PartialEq + Send + Sync + 'static,
    OwnProps: Send + Sync + 'static,
{
    pub fn with_own_props<State, A>(
        store: &Store<State, A>,
        own_props: OwnProps,
        map_state_to_props: impl Fn(&State, &OwnProps) -> Props + Send + Sync + 'static,
        map_dispatch_to_props: impl FnOnce(AnyActionSender<A>, &OwnProps) -> Handlers,
    ) -> Self
    where
        State: Send + Sync + 'static,
        A: Action,
    {
        let own_props = Arc::new(Mutex::new(Arc::new(own_props)));
        let initial = {
            let own = own_props.lock().clone();
            map_state_to_props(&store.state(), &own)
        };
        let props = Arc::new(Mutex::new(Arc::new(initial)));
        let version = Arc::new(AtomicU64::new(0));

        let refresh: Refresh = {
            let store = store.clone();
            let props = props.clone();
            let own_props = own_props.clone();
            let version = version.clone();
            Arc::new(move || loop {
                let state = store.state();
                let own = own_props.lock().clone();
                let next = map_state_to_props(&state, &own);

                let mut current = props.lock();
                // Derived from a stale snapshot; a newer one may already be stored.
                if !Arc::ptr_eq(&state, &store.state()) || !Arc::ptr_eq(&own, &*own_props.lock()) {
                    continue;
                }
                if **current != next {
                    *current = Arc::new(next);
                    version.fetch_add(1, Ordering::AcqRel);
                }
                break;
            })
        };

        let listener = refresh.clone();
        let subscription = store.subscribe(move || listener());
        // Catches commits between the initial derivation and the subscription.
        refresh();

        let handlers = {
            let own = own_props.lock().clone();
            map_dispatch_to_props(AnyActionSender::new(store.clone()), &own)
        };

        Self {
            props,
            own_props,
            version,
            handlers,
            refresh: Some(refresh),
            subscription: Some(subscription),
        }
    }
}

impl<Handlers> Connected<(), Handlers> {
    /// Binds handlers only. The view never re-derives props and does not
    /// subscribe to the store.
    pub fn without_state<State, A>(
        store: &Store<State, A>,
        map_dispatch_to_props: impl FnOnce(AnyActionSender<A>) -> Handlers,
    ) -> Self
    where
        State: Send + Sync + 'static,
        A: Action,
    {
        Self {
            props: Arc::new(Mutex::new(Arc::new(()))),
            own_props: Arc::new(Mutex::new(Arc::new(()))),
            version: Arc::new(AtomicU64::new(0)),
            handlers: map_dispatch_to_props(AnyActionSender::new(store.clone())),
            refresh: None,
            subscription: None,
        }
    }
}

impl<Props, Handlers, OwnProps> Connected<Props, Handlers, OwnProps> {
    pub fn props(&self) -> Arc<Props> {
        self.props.lock().clone()
    }

    pub fn own_props(&self) -> Arc<OwnProps> {
        self.own_props.lock().clone()
    }

    /// Replaces the own props and re-derives props from them. Handlers keep
    /// the own props they were bound with.
    pub fn set_own_props(&self, own_props: OwnProps) {
        *self.own_props.lock() = Arc::new(own_props);
        if let Some(refresh) = &self.refresh {
            refresh();
        }
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl<Props, Handlers, OwnProps> Drop for Connected<Props, Handlers, OwnProps> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod test {
    use crate::reducer::state_or_default;
    use crate::{ActionSender, StoreError, INIT_ACTION_TYPE};

    use super::*;

    #[derive(Debug, Default)]
    struct State {
        count: i32,
        clicks: u32,
    }

    #[derive(Debug)]
    enum CounterAction {
        Init,
        Increase,
        Click,
    }

    impl Action for CounterAction {
        fn action_type(&self) -> &str {
            match self {
                Self::Init => INIT_ACTION_TYPE,
                Self::Increase => "increase",
                Self::Click => "click",
            }
        }

        fn init() -> Self {
            Self::Init
        }
    }

    fn counter(state: Option<&Arc<State>>, action: &CounterAction) -> anyhow::Result<Arc<State>> {
        let state = state_or_default(state);
        Ok(match action {
            CounterAction::Increase => Arc::new(State {
                count: state.count + 1,
                clicks: state.clicks,
            }),
            CounterAction::Click => Arc::new(State {
                count: state.count,
                clicks: state.clicks + 1,
            }),
            CounterAction::Init => state,
        })
    }

    #[derive(Debug, PartialEq)]
    struct Props {
        value: i32,
    }

    struct Handlers {
        on_increase_click: Box<dyn Fn() -> Result<(), StoreError> + Send + Sync>,
    }

    fn map_dispatch(sender: AnyActionSender<CounterAction>) -> Handlers {
        Handlers {
            on_increase_click: Box::new(move || sender.send(CounterAction::Increase)),
        }
    }

    #[test]
    fn test_props_follow_state() {
        let store = Store::new(counter).unwrap();
        let view = Connected::new(&store, |state: &State| Props { value: state.count }, map_dispatch);
        assert_eq!(*view.props(), Props { value: 0 });

        (view.handlers().on_increase_click)().unwrap();
        (view.handlers().on_increase_click)().unwrap();

        assert_eq!(*view.props(), Props { value: 2 });
        assert_eq!(view.version(), 2);
        assert_eq!(store.state().count, 2);
    }

    #[test]
    fn test_unrelated_change_keeps_version() {
        let store = Store::new(counter).unwrap();
        let view = Connected::new(&store, |state: &State| Props { value: state.count }, map_dispatch);
        let before = view.props();

        store.dispatch(CounterAction::Click).unwrap();

        assert_eq!(view.version(), 0);
        assert!(Arc::ptr_eq(&before, &view.props()));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = Store::new(counter).unwrap();
        let view = Connected::new(&store, |state: &State| Props { value: state.count }, map_dispatch);
        assert_eq!(store.listener_count(), 1);
        drop(view);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_dispatch_during_initial_mapping_is_seen() {
        let store = Store::new(counter).unwrap();
        let first_call = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let worker = store.clone();
        let view = Connected::new(
            &store,
            move |state: &State| {
                if first_call.swap(false, Ordering::SeqCst) {
                    let worker = worker.clone();
                    std::thread::spawn(move || worker.dispatch(CounterAction::Increase))
                        .join()
                        .unwrap()
                        .unwrap();
                }
                Props { value: state.count }
            },
            map_dispatch,
        );

        assert_eq!(store.state().count, 1);
        assert_eq!(*view.props(), Props { value: 1 });
        assert_eq!(view.version(), 1);
    }

    #[test]
    fn test_dispatch_while_binding_handlers_is_seen() {
        let store = Store::new(counter).unwrap();
        let view = Connected::new(
            &store,
            |state: &State| Props { value: state.count },
            |sender: AnyActionSender<CounterAction>| {
                sender.send(CounterAction::Increase).unwrap();
                map_dispatch(sender)
            },
        );

        assert_eq!(*view.props(), Props { value: 1 });
    }

    #[derive(Debug, PartialEq)]
    struct Label {
        text: String,
    }

    struct Step {
        by: u32,
    }

    struct StepHandlers {
        on_step: Box<dyn Fn() -> Result<(), StoreError> + Send + Sync>,
    }

    #[test]
    fn test_own_props_feed_both_mappers() {
        let store = Store::new(counter).unwrap();
        let view = Connected::with_own_props(
            &store,
            Step { by: 3 },
            |state: &State, own: &Step| Label {
                text: format!("{} (+{})", state.count, own.by),
            },
            |sender: AnyActionSender<CounterAction>, own: &Step| {
                let by = own.by;
                StepHandlers {
                    on_step: Box::new(move || {
                        for _ in 0..by {
                            sender.send(CounterAction::Increase)?;
                        }
                        Ok(())
                    }),
                }
            },
        );
        assert_eq!(view.props().text, "0 (+3)");

        (view.handlers().on_step)().unwrap();

        assert_eq!(store.state().count, 3);
        assert_eq!(view.props().text, "3 (+3)");
    }

    #[test]
    fn test_set_own_props_rederives() {
        let store = Store::new(counter).unwrap();
        let view = Connected::with_own_props(
            &store,
            Step { by: 1 },
            |state: &State, own: &Step| Label {
                text: format!("{} (+{})", state.count, own.by),
            },
            |_: AnyActionSender<CounterAction>, _: &Step| (),
        );

        view.set_own_props(Step { by: 5 });

        assert_eq!(view.own_props().by, 5);
        assert_eq!(view.props().text, "0 (+5)");
        assert_eq!(view.version(), 1);
    }

    #[test]
    fn test_without_state_only_dispatches() {
        let store = Store::new(counter).unwrap();
        let view = Connected::without_state(&store, map_dispatch);
        assert!(!view.is_subscribed());
        assert_eq!(store.listener_count(), 0);

        (view.handlers().on_increase_click)().unwrap();

        assert_eq!(store.state().count, 1);
        assert_eq!(view.version(), 0);
    }
}
