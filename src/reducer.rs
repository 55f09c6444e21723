use std::sync::Arc;

/// `state` is `None` before the first reduction. Returning the same `Arc`
/// marks the action as a no-op.
pub trait Reducer<State, Action>: Send + Sync {
    fn reduce(&self, state: Option<&Arc<State>>, action: &Action) -> anyhow::Result<Arc<State>>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(Option<&Arc<State>>, &Action) -> anyhow::Result<Arc<State>> + Send + Sync,
{
    fn reduce(&self, state: Option<&Arc<State>>, action: &Action) -> anyhow::Result<Arc<State>> {
        self(state, action)
    }
}

pub fn state_or_default<State: Default>(state: Option<&Arc<State>>) -> Arc<State> {
    state.cloned().unwrap_or_default()
}
