//! TOML replay script format.
//!
//! ```toml
//! [detector]
//! touch_slop = 10.0
//!
//! [listener]
//! consume_every = 1
//!
//! [[events]]
//! action = "begin"
//! id = 0
//! x = 0.0
//! y = 0.0
//!
//! [[events]]
//! action = "move"
//! contacts = [{ id = 0, x = 25.0, y = 0.0 }]
//!
//! [[events]]
//! action = "end"
//! id = 0
//! x = 25.0
//! y = 0.0
//! ```

use crate::config::ConfigOverrides;
use crate::detector::{Contact, TouchEvent};
use crate::replay::error::ReplayError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ReplayScript {
    /// Overrides applied on top of the layered detector config
    #[serde(default)]
    pub detector: ConfigOverrides,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// The listener reports every n-th transform as consumed; 0 never consumes
    pub consume_every: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { consume_every: 1 }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct ScriptContact {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

impl From<ScriptContact> for Contact {
    fn from(contact: ScriptContact) -> Self {
        Contact::at(contact.id, contact.x, contact.y)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptEvent {
    Begin(ScriptContact),
    Move { contacts: Vec<ScriptContact> },
    End(ScriptContact),
    Cancel(ScriptContact),
}

impl From<&ScriptEvent> for TouchEvent {
    fn from(event: &ScriptEvent) -> Self {
        match event {
            ScriptEvent::Begin(c) => TouchEvent::Begin((*c).into()),
            ScriptEvent::Move { contacts } => {
                TouchEvent::Move(contacts.iter().map(|c| (*c).into()).collect())
            }
            ScriptEvent::End(c) => TouchEvent::End((*c).into()),
            ScriptEvent::Cancel(c) => TouchEvent::Cancel((*c).into()),
        }
    }
}

impl ReplayScript {
    pub fn from_toml_str(content: &str) -> Result<Self, ReplayError> {
        let script: ReplayScript = toml::from_str(content)?;
        debug!("Parsed replay script with {} events", script.events.len());
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn touch_events(&self) -> Vec<TouchEvent> {
        self.events.iter().map(TouchEvent::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_actions() {
        let script = ReplayScript::from_toml_str(
            r#"
            [[events]]
            action = "begin"
            id = 0
            x = 1.0
            y = 2.0

            [[events]]
            action = "move"
            contacts = [{ id = 0, x = 3.0, y = 4.0 }]

            [[events]]
            action = "cancel"
            id = 0
            x = 3.0
            y = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(script.listener.consume_every, 1);
        assert_eq!(
            script.touch_events(),
            vec![
                TouchEvent::Begin(Contact::at(0, 1.0, 2.0)),
                TouchEvent::Move(vec![Contact::at(0, 3.0, 4.0)]),
                TouchEvent::Cancel(Contact::at(0, 3.0, 4.0)),
            ]
        );
    }

    #[test]
    fn unknown_action_is_a_parse_error() {
        let result = ReplayScript::from_toml_str(
            r#"
            [[events]]
            action = "hover"
            id = 0
            x = 1.0
            y = 2.0
            "#,
        );
        assert!(matches!(result, Err(ReplayError::Parse(_))));
    }
}
