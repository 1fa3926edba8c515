//! Beatline Control - Input Mapping
//!
//! Maps physical keys to the logical [`InputAction`]s the round controller
//! consumes. The core never sees raw keys.
//!
//! ```rust
//! use beatline_control::{Key, KeyBindings};
//! use beatline_core::{InputAction, Player, RoundMode};
//!
//! let bindings = KeyBindings::new();
//! let action = bindings.find_action(Key::Char('a'), RoundMode::Play);
//! assert_eq!(action, Some(InputAction::Hit(Player::One)));
//! ```
//!
//! [`InputAction`]: beatline_core::InputAction

#![warn(missing_docs)]

/// Error types
pub mod error;
/// Key bindings
pub mod bindings;

pub use bindings::{Binding, BindingContext, Key, KeyBindings, KeyMatch};
pub use error::{ControlError, Result};
