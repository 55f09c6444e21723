use std::sync::Arc;

use crate::action::Action;
use crate::error::StoreError;
use crate::reducer::Reducer;
use crate::store::Store;

pub(crate) const DEFAULT_NAME: &str = "store";
pub(crate) const DEFAULT_OBSERVER_CAPACITY: usize = 16;

pub struct StoreBuilder<State, Action> {
    reducer: Arc<dyn Reducer<State, Action>>,
    name: String,
    preloaded_state: Option<State>,
    observer_capacity: usize,
}

impl<State, A> StoreBuilder<State, A>
where
    State: Send + Sync + 'static,
    A: Action,
{
    pub fn new(reducer: impl Reducer<State, A> + 'static) -> Self {
        Self {
            reducer: Arc::new(reducer),
            name: DEFAULT_NAME.to_string(),
            preloaded_state: None,
            observer_capacity: DEFAULT_OBSERVER_CAPACITY,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn preloaded_state(mut self, state: State) -> Self {
        self.preloaded_state = Some(state);
        self
    }

    /// Buffer size of the channel behind `Store::observe`.
    pub fn observer_capacity(mut self, capacity: usize) -> Self {
        self.observer_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Store<State, A>, StoreError> {
        let state = match self.preloaded_state {
            Some(state) => Arc::new(state),
            None => {
                let init = A::init();
                self.reducer
                    .reduce(None, &init)
                    .map_err(|source| StoreError::Reducer {
                        action_type: init.action_type().to_string(),
                        source,
                    })?
            }
        };
        log::debug!("[{}] created", self.name);
        Ok(Store::from_parts(
            self.name.into(),
            self.reducer,
            state,
            self.observer_capacity,
        ))
    }
}
