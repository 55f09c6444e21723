use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("action has no `type` discriminator")]
    MissingActionType,

    #[error("cannot dispatch `{action_type}` while another dispatch is in progress; reducers and listeners may not dispatch")]
    Reentrant { action_type: String },

    #[error("reducer failed while handling `{action_type}`")]
    Reducer {
        action_type: String,
        #[source]
        source: anyhow::Error,
    },
}
