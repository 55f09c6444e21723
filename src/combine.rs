/// Builds a state struct of `Arc` slices and a `reducer()` that runs each
/// slice reducer on its own slice only.
///
/// ```
/// use std::sync::Arc;
/// use redux::{combine_reducers, state_or_default, Action, Store};
///
/// #[derive(Debug)]
/// enum Msg { Init, Bump }
///
/// impl Action for Msg {
///     fn action_type(&self) -> &str {
///         match self {
///             Msg::Init => redux::INIT_ACTION_TYPE,
///             Msg::Bump => "bump",
///         }
///     }
///     fn init() -> Self { Msg::Init }
/// }
///
/// fn hits(state: Option<&Arc<u32>>, action: &Msg) -> redux::anyhow::Result<Arc<u32>> {
///     let state = state_or_default(state);
///     Ok(match action {
///         Msg::Bump => Arc::new(*state + 1),
///         Msg::Init => state,
///     })
/// }
///
/// fn label(state: Option<&Arc<String>>, _: &Msg) -> redux::anyhow::Result<Arc<String>> {
///     Ok(state_or_default(state))
/// }
///
/// combine_reducers! {
///     #[derive(Debug)]
///     pub struct Page<Msg> {
///         hits: u32 = hits,
///         label: String = label,
///     }
/// }
///
/// let store = Store::new(Page::reducer())?;
/// store.dispatch(Msg::Bump)?;
/// assert_eq!(*store.state().hits, 1);
/// # Ok::<(), redux::StoreError>(())
/// ```
#[macro_export]
macro_rules! combine_reducers {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident < $action:ty > {
            $($field:ident : $slice:ty = $reducer:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(pub $field: ::std::sync::Arc<$slice>,)+
        }

        impl $name {
            /// Root reducer over every slice of this state.
            #[allow(dead_code)]
            pub fn reducer() -> impl $crate::Reducer<$name, $action> {
                |state: ::std::option::Option<&::std::sync::Arc<$name>>,
                 action: &$action|
                 -> $crate::anyhow::Result<::std::sync::Arc<$name>> {
                    let mut changed = state.is_none();
                    $(
                        let previous = state.map(|state| &state.$field);
                        let $field: ::std::sync::Arc<$slice> =
                            $crate::Reducer::<$slice, $action>::reduce(&$reducer, previous, action)?;
                        changed |= previous
                            .map_or(true, |previous| !::std::sync::Arc::ptr_eq(previous, &$field));
                    )+
                    match state {
                        ::std::option::Option::Some(state) if !changed => {
                            ::std::result::Result::Ok(::std::sync::Arc::clone(state))
                        }
                        _ => ::std::result::Result::Ok(::std::sync::Arc::new($name { $($field,)+ })),
                    }
                }
            }
        }
    };
}
