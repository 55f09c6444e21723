mod action;
mod action_mapper;
mod action_sender;
mod builder;
mod change_observer;
mod combine;
mod connect;
mod error;
mod listener;
mod reducer;
mod store;

pub use action::{Action, INIT_ACTION_TYPE};
pub use action_mapper::ActionMapper;
pub use action_sender::{ActionSender, AnyActionSender};
pub use builder::StoreBuilder;
pub use change_observer::ChangeObserver;
pub use connect::Connected;
pub use error::StoreError;
pub use listener::Unsubscribe;
pub use reducer::{state_or_default, Reducer};
pub use store::Store;

pub use anyhow;
