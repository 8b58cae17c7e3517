//! Macros for naming state ids.

/// Declare an enum of named state ids.
///
/// The generated enum is `Copy` and provides `id()`, `ALL`,
/// `From<Enum> for StateId` and `TryFrom<StateId>` (failing with
/// [`FsmError::NotFound`](crate::FsmError::NotFound)).
///
/// # Example
///
/// ```
/// use tickfsm::{state_ids, StateId};
///
/// state_ids! {
///     pub enum Mode {
///         Idle = 1,
///         Active = 2,
///         Error = 3,
///     }
/// }
///
/// assert_eq!(Mode::Active.id(), 2);
/// assert_eq!(StateId::from(Mode::Error), 3);
/// assert_eq!(Mode::try_from(1), Ok(Mode::Idle));
/// assert!(Mode::try_from(99).is_err());
/// ```
#[macro_export]
macro_rules! state_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every declared state, in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];

            /// Numeric id of this state.
            pub const fn id(self) -> $crate::StateId {
                match self {
                    $(Self::$variant => $value),*
                }
            }
        }

        impl ::core::convert::From<$name> for $crate::StateId {
            fn from(state: $name) -> Self {
                state.id()
            }
        }

        impl ::core::convert::TryFrom<$crate::StateId> for $name {
            type Error = $crate::FsmError;

            fn try_from(id: $crate::StateId) -> ::core::result::Result<Self, $crate::FsmError> {
                $(
                    if id == $value {
                        return ::core::result::Result::Ok(Self::$variant);
                    }
                )*
                ::core::result::Result::Err($crate::FsmError::NotFound(id))
            }
        }
    };
}
