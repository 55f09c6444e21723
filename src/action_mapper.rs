use crate::action_sender::{ActionSender, AnyActionSender};
use crate::error::StoreError;

pub struct ActionMapper<Action, MappedAction, F>
where
    Action: Send,
    MappedAction: Send + 'static,
    F: Fn(Action) -> MappedAction + Send + Sync + 'static,
{
    parent: AnyActionSender<MappedAction>,
    map: F,
    _phantom: std::marker::PhantomData<fn(Action)>,
}

impl<Action, MappedAction, F> ActionMapper<Action, MappedAction, F>
where
    Action: Send,
    MappedAction: Send + 'static,
    F: Fn(Action) -> MappedAction + Send + Sync + 'static,
{
    pub fn new(parent: AnyActionSender<MappedAction>, map: F) -> Self {
        Self {
            parent,
            map,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<Action, MappedAction, F> ActionSender for ActionMapper<Action, MappedAction, F>
where
    Action: Send + 'static,
    MappedAction: Send + 'static,
    F: Fn(Action) -> MappedAction + Send + Sync + 'static,
{
    type SendableAction = Action;

    fn send(&self, action: Action) -> Result<(), StoreError> {
        let mapped = (self.map)(action);
        self.parent.send(mapped)
    }
}
