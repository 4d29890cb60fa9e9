//! Click/scroll to cycle through a fixed set of icon options

use super::ControlError;
use crate::resources::ResourceLocation;

/// Callback fired synchronously whenever the selected option changes
pub type ChangeCallback = Box<dyn FnMut(&str) + Send>;

/// A select control displaying one icon per option
///
/// Exactly one option is current at any time; the first option is selected at
/// construction without firing the change callback.
pub struct CycleSelect {
    container_id: String,
    select_id: String,
    base_path: ResourceLocation,
    /// (option name, icon file) in display order
    options: Vec<(String, String)>,
    current: usize,
    on_change: Option<ChangeCallback>,
}

impl std::fmt::Debug for CycleSelect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleSelect")
            .field("container_id", &self.container_id)
            .field("options", &self.options)
            .field("current", &self.current)
            .finish()
    }
}

impl CycleSelect {
    /// Create a cycle select
    ///
    /// Fails if `options` is empty or `container_id` is empty.
    pub fn new(
        container_id: &str,
        select_id: &str,
        options: Vec<(String, String)>,
        base_path: ResourceLocation,
    ) -> Result<Self, ControlError> {
        if options.is_empty() {
            return Err(ControlError::EmptyOptions);
        }
        if container_id.is_empty() {
            return Err(ControlError::MissingContainerId);
        }

        Ok(Self {
            container_id: container_id.to_string(),
            select_id: select_id.to_string(),
            base_path,
            options,
            current: 0,
            on_change: None,
        })
    }

    /// Bind the change callback
    pub fn with_on_change(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn select_id(&self) -> &str {
        &self.select_id
    }

    /// Option names in display order
    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Name of the currently selected option
    pub fn value(&self) -> &str {
        &self.options[self.current].0
    }

    pub fn index(&self) -> usize {
        self.current
    }

    /// Select an option by name and fire the change callback
    pub fn set_value(&mut self, value: &str) -> Result<(), ControlError> {
        let index = self
            .options
            .iter()
            .position(|(name, _)| name == value)
            .ok_or_else(|| ControlError::UnknownOption(value.to_string()))?;
        self.select_index(index);
        Ok(())
    }

    fn select_index(&mut self, index: usize) {
        self.current = index;
        let value = self.options[index].0.clone();
        log::debug!("CycleSelect[{}]: selected '{}'", self.container_id, value);
        if let Some(callback) = self.on_change.as_mut() {
            callback(&value);
        }
    }

    /// Advance to the next option, wrapping around at the end
    pub fn select_next(&mut self) {
        let next = (self.current + 1) % self.options.len();
        self.select_index(next);
    }

    /// Step forwards or backwards, clamping at both ends
    pub fn step_clamped(&mut self, increase: bool) {
        let target = if increase {
            (self.current + 1).min(self.options.len() - 1)
        } else {
            self.current.saturating_sub(1)
        };
        self.select_index(target);
    }

    /// Element id for an option: `{container}--{option}`
    pub fn option_id(&self, key: &str) -> String {
        format!("{}--{}", self.container_id, key)
    }

    /// Whether the icon for `key` is the visible one
    pub fn is_visible(&self, key: &str) -> bool {
        self.value() == key
    }

    /// Location of the icon for `key`
    pub fn icon_location(&self, key: &str) -> Option<ResourceLocation> {
        self.options
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, icon)| self.base_path.join(icon))
    }

    /// Location of the icon currently shown
    pub fn current_icon(&self) -> ResourceLocation {
        self.base_path.join(&self.options[self.current].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn options(names: &[&str]) -> Vec<(String, String)> {
        names.iter().map(|n| (n.to_string(), format!("{}.svg", n))).collect()
    }

    fn base() -> ResourceLocation {
        ResourceLocation::Path(PathBuf::from("/static/icons"))
    }

    #[test]
    fn test_rejects_empty_options() {
        let err = CycleSelect::new("container", "select", Vec::new(), base()).unwrap_err();
        assert_eq!(err, ControlError::EmptyOptions);
    }

    #[test]
    fn test_rejects_missing_container_id() {
        let err = CycleSelect::new("", "select", options(&["a"]), base()).unwrap_err();
        assert_eq!(err, ControlError::MissingContainerId);
    }

    #[test]
    fn test_first_option_selected_initially() {
        let select = CycleSelect::new("c", "s", options(&["a", "b"]), base()).unwrap();
        assert_eq!(select.value(), "a");
        assert!(select.is_visible("a"));
        assert!(!select.is_visible("b"));
    }

    #[test]
    fn test_unknown_value_fails() {
        let mut select = CycleSelect::new("c", "s", options(&["a", "b"]), base()).unwrap();
        assert_eq!(
            select.set_value("z"),
            Err(ControlError::UnknownOption("z".to_string()))
        );
        assert_eq!(select.value(), "a");
    }

    #[test]
    fn test_cycling_n_times_returns_to_start() {
        let mut select = CycleSelect::new("c", "s", options(&["a", "b", "c"]), base()).unwrap();
        select.set_value("b").unwrap();
        for _ in 0..select.len() {
            select.select_next();
        }
        assert_eq!(select.value(), "b");
    }

    #[test]
    fn test_change_callback_fires_synchronously() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut select = CycleSelect::new("c", "s", options(&["a", "b"]), base())
            .unwrap()
            .with_on_change(move |v| sink.lock().unwrap().push(v.to_string()));

        select.select_next();
        select.select_next();
        select.set_value("b").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_step_clamped_does_not_wrap() {
        let mut select = CycleSelect::new("c", "s", options(&["a", "b"]), base()).unwrap();
        select.step_clamped(false);
        assert_eq!(select.value(), "a");
        select.step_clamped(true);
        select.step_clamped(true);
        assert_eq!(select.value(), "b");
    }

    #[test]
    fn test_ids_and_icons() {
        let select = CycleSelect::new("granularity", "s", options(&["1"]), base()).unwrap();
        assert_eq!(select.option_id("1"), "granularity--1");
        assert_eq!(
            select.current_icon(),
            ResourceLocation::Path(PathBuf::from("/static/icons/1.svg"))
        );
        assert!(select.icon_location("2").is_none());
    }
}
