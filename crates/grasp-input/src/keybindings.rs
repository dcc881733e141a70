//! Binding persistence and conflict detection.
//!
//! Provides [`Conflict`] detection and RON-based save/load for [`InputMap`]
//! with fallback to defaults on error.

use crate::action_map::{Action, ButtonBinding, InputMap};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Errors from writing a binding file.
#[derive(Debug, thiserror::Error)]
pub enum InputMapError {
    /// Failed to create the directory or write the file.
    #[error("failed to write bindings: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the table to RON.
    #[error("failed to serialize bindings: {0}")]
    Serialize(#[from] ron::Error),
}

/// The same [`ButtonBinding`] is used by multiple actions.
///
/// Not necessarily a mistake: the trigger commonly both grabs and feeds the
/// gesture recognizer.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// The shared binding.
    pub binding: ButtonBinding,
    /// Actions that share it, sorted.
    pub actions: Vec<Action>,
}

impl InputMap {
    /// Detect all bindings shared by more than one action.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut seen: HashMap<ButtonBinding, Vec<Action>> = HashMap::new();

        for (action, bindings) in &self.bindings {
            for binding in bindings {
                seen.entry(*binding).or_default().push(*action);
            }
        }

        seen.into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .map(|(binding, mut actions)| {
                actions.sort();
                Conflict { binding, actions }
            })
            .collect()
    }

    /// Save the input map to a RON file at `path`.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self, path: &Path) -> Result<(), InputMapError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let ron_str = self.to_ron()?;
        std::fs::write(path, ron_str)?;
        Ok(())
    }

    /// Load an input map from a RON file at `path`.
    ///
    /// Falls back to [`InputMap::default`] if the file is missing or malformed,
    /// logging a warning in either case.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_ron(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Malformed binding file {}: {e}; using defaults",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    "Could not read binding file {}: {e}; using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Returns the platform config path for `bindings.ron`.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("grasp").join("bindings.ron"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ControllerButton;

    #[test]
    fn test_default_map_has_no_conflicts() {
        assert!(InputMap::default().detect_conflicts().is_empty());
    }

    #[test]
    fn test_shared_trigger_reported() {
        let mut map = InputMap::default();
        map.set_bindings(
            Action::ComplexGesture,
            vec![ButtonBinding::any(ControllerButton::Trigger)],
        );
        let conflicts = map.detect_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].binding.button, ControllerButton::Trigger);
        assert_eq!(
            conflicts[0].actions,
            vec![Action::Grab, Action::ComplexGesture]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bindings.ron");
        let mut map = InputMap::default();
        map.set_bindings(
            Action::Dolly,
            vec![ButtonBinding::any(ControllerButton::Joystick)],
        );
        map.save(&path).unwrap();
        assert_eq!(InputMap::load(&path), map);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let map = InputMap::load(&dir.path().join("absent.ron"));
        assert_eq!(map, InputMap::default());
    }

    #[test]
    fn test_malformed_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.ron");
        std::fs::write(&path, "{{ not ron").unwrap();
        assert_eq!(InputMap::load(&path), InputMap::default());
    }
}
