pub const INIT_ACTION_TYPE: &str = "@@redux/INIT";

pub trait Action: std::fmt::Debug + Send + Sync + 'static {
    /// The discriminator. An empty string is rejected by `Store::dispatch`.
    fn action_type(&self) -> &str;

    fn init() -> Self
    where
        Self: Sized;
}
