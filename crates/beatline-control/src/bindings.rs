//! Keyboard bindings manager

use crate::error::{ControlError, Result};
use beatline_core::{InputAction, PlayMode, Player, RoundMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// A physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    /// Character key, stored lowercase
    Char(char),
    /// Space bar
    Space,
    /// Enter / return
    Enter,
    /// Escape
    Escape,
}

impl Key {
    /// Character key, case-insensitive. Space, newline and escape map to
    /// their named keys.
    pub fn char(c: char) -> Self {
        match c {
            ' ' => Key::Space,
            '\n' | '\r' => Key::Enter,
            '\u{1b}' => Key::Escape,
            c => Key::Char(c.to_ascii_lowercase()),
        }
    }

    /// Parse the `U+XXXX` form used for characters without a printable name
    fn from_code_point(s: &str) -> Option<Self> {
        let hex = s.strip_prefix("U+").or_else(|| s.strip_prefix("u+"))?;
        let c = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
        Some(Key::Char(c.to_ascii_lowercase()))
    }

    fn normalized(self) -> Self {
        match self {
            Key::Char(c) => Key::char(c),
            other => other,
        }
    }
}

impl FromStr for Key {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !c.is_whitespace() {
                return Ok(Key::char(c));
            }
        }
        if let Some(key) = Self::from_code_point(s) {
            return Ok(key);
        }
        match s.to_ascii_lowercase().as_str() {
            "space" | " " => Ok(Key::Space),
            "enter" | "return" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            _ => Err(ControlError::UnknownKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = ControlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> String {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) if c.is_whitespace() || c.is_control() => {
                write!(f, "U+{:04X}", *c as u32)
            }
            Key::Char(c) => write!(f, "{}", c),
            Key::Space => f.write_str("space"),
            Key::Enter => f.write_str("enter"),
            Key::Escape => f.write_str("escape"),
        }
    }
}

/// Which keys a binding reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMatch {
    /// One specific key
    Exact(Key),
    /// Any key at all
    AnyKey,
}

impl KeyMatch {
    fn matches(&self, key: Key) -> bool {
        match self {
            KeyMatch::Exact(bound) => bound.normalized() == key.normalized(),
            KeyMatch::AnyKey => true,
        }
    }
}

/// Round state in which a binding is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingContext {
    /// Every state
    Any,
    /// Only in one round state
    Mode(RoundMode),
}

impl BindingContext {
    fn matches(&self, mode: RoundMode) -> bool {
        match self {
            BindingContext::Any => true,
            BindingContext::Mode(bound) => *bound == mode,
        }
    }
}

/// One key → action mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Key(s) that trigger it
    pub key: KeyMatch,
    /// Action produced
    pub action: InputAction,
    /// When it applies
    pub context: BindingContext,
    /// Disabled bindings are skipped
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Human-readable label
    #[serde(default)]
    pub description: String,
}

fn default_enabled() -> bool {
    true
}

impl Binding {
    /// Create an enabled binding for one key
    pub fn new(key: Key, action: InputAction, context: BindingContext, description: &str) -> Self {
        Self {
            key: KeyMatch::Exact(key),
            action,
            context,
            enabled: true,
            description: description.to_string(),
        }
    }

    fn matches(&self, key: Key, mode: RoundMode) -> bool {
        self.enabled && self.context.matches(mode) && self.key.matches(key)
    }
}

/// Serializable key bindings for save/load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyBindingsData {
    bindings: Vec<Binding>,
}

/// Key binding manager
///
/// Bindings are checked in order and the first match wins, so specific keys
/// must come before catch-all bindings of the same state.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: Vec<Binding>,
}

impl KeyBindings {
    /// Create a manager with the default layout
    pub fn new() -> Self {
        Self {
            bindings: Self::defaults(),
        }
    }

    /// Create an empty manager
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Default layout: A/D drum for player one, J/L for player two, 1/2 pick
    /// the mode, R restarts and any key leaves the ready screen
    pub fn defaults() -> Vec<Binding> {
        use BindingContext::Mode;

        let mut bindings = vec![
            Binding::new(
                Key::Char('1'),
                InputAction::ChooseMode(PlayMode::Scripted),
                Mode(RoundMode::Select),
                "Play the built-in song",
            ),
            Binding::new(
                Key::Char('2'),
                InputAction::ChooseMode(PlayMode::Live),
                Mode(RoundMode::Select),
                "Play along to live audio",
            ),
            Binding::new(
                Key::Space,
                InputAction::AdvanceMode,
                Mode(RoundMode::Select),
                "Start with the last chosen mode",
            ),
        ];

        for (c, player) in [
            ('a', Player::One),
            ('d', Player::One),
            ('j', Player::Two),
            ('l', Player::Two),
        ] {
            bindings.push(Binding::new(
                Key::Char(c),
                InputAction::Hit(player),
                Mode(RoundMode::Play),
                &format!("{} drum", player),
            ));
        }

        bindings.push(Binding::new(
            Key::Char('r'),
            InputAction::Reset,
            Mode(RoundMode::End),
            "Back to the title screen",
        ));
        bindings.push(Binding {
            key: KeyMatch::AnyKey,
            action: InputAction::AdvanceMode,
            context: Mode(RoundMode::Ready),
            enabled: true,
            description: "Press any key".to_string(),
        });
        bindings
    }

    /// Find the action for a key press in round state `mode`
    pub fn find_action(&self, key: Key, mode: RoundMode) -> Option<InputAction> {
        self.bindings
            .iter()
            .find(|binding| binding.matches(key, mode))
            .map(|binding| binding.action)
    }

    /// Add a binding at the end of the list
    pub fn add_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// Remove a binding by index
    pub fn remove_binding(&mut self, index: usize) -> Option<Binding> {
        if index < self.bindings.len() {
            Some(self.bindings.remove(index))
        } else {
            None
        }
    }

    /// All bindings in match order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Bindings producing `action`
    pub fn find_bindings_for_action(&self, action: InputAction) -> Vec<&Binding> {
        self.bindings
            .iter()
            .filter(|b| b.action == action)
            .collect()
    }

    /// Check if an exact key is already bound in `mode`
    pub fn is_key_bound(&self, key: Key, mode: RoundMode) -> bool {
        self.bindings.iter().any(|b| {
            b.enabled
                && b.context.matches(mode)
                && matches!(b.key, KeyMatch::Exact(bound) if bound.normalized() == key.normalized())
        })
    }

    /// Reset to the default layout
    pub fn reset_to_defaults(&mut self) {
        self.bindings = Self::defaults();
        info!("Key bindings reset to defaults");
    }

    /// Load from JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let bindings = Self::from_json(&json)?;
        info!("Loaded {} key bindings", bindings.bindings.len());
        Ok(bindings)
    }

    /// Save to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        info!("Saved {} key bindings", self.bindings.len());
        Ok(())
    }

    /// Export to JSON string
    pub fn to_json(&self) -> Result<String> {
        let data = KeyBindingsData {
            bindings: self.bindings.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Import from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let data: KeyBindingsData = serde_json::from_str(json)?;
        Ok(Self {
            bindings: data.bindings,
        })
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
