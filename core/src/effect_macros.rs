//! Declarative macros for ergonomic effect construction
//!
//! Timers are the only effects the stores build by hand often enough to
//! want shorthand: a plain delay, and a delay registered under an id so a
//! later reduction can cancel it.

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use railbook_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(4),
///     action: UiAction::ClearGlobalError
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` timer that dispatches `action` after `duration`
///
/// # Example
///
/// ```rust,ignore
/// use railbook_core::cancellable_delay;
///
/// cancellable_delay! {
///     id: EffectId::new("notification:42"),
///     duration: Duration::from_millis(4000),
///     action: UiAction::RemoveNotification(id)
/// }
/// ```
#[macro_export]
macro_rules! cancellable_delay {
    (
        id: $id:expr,
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::delay! {
                duration: $duration,
                action: $action
            }),
        }
    };
}
