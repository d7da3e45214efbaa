//! Core State trait for state machine states.
//!
//! Every state a machine can occupy implements this trait. States are
//! immutable values; a machine "moves" by replacing its current value
//! with the one a resolver returns.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure. States usually are enums whose variants carry
/// exactly the data the next action needs.
///
/// # Required Traits
///
/// - `Clone`: the current state is handed out to readers and listeners
/// - `PartialEq`: the engine only notifies listeners when the state changes
/// - `Debug`: states show up in logs
/// - `Serialize` + `Deserialize`: states can be checkpointed
///
/// # Example
///
/// ```rust
/// use authflow::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum DeviceState {
///     Unknown,
///     Remembering { device_key: String },
///     Remembered,
///     Failed(String),
/// }
///
/// impl State for DeviceState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Unknown => "Unknown",
///             Self::Remembering { .. } => "Remembering",
///             Self::Remembered => "Remembered",
///             Self::Failed(_) => "Failed",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Remembered | Self::Failed(_))
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Failed(_))
///     }
/// }
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's variant name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Error states are typically also final, but this is not enforced.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
