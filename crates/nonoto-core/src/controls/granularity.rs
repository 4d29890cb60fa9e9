//! Time-granularity picker for the sheet overlay

use super::{ControlError, CycleSelect};
use crate::resources::ResourceLocation;

/// Icon used for granularities without a dedicated icon
pub const DEFAULT_GRANULARITY_ICON: &str = "whole.svg";

const KNOWN_ICONS: [(u32, &str); 6] = [
    (1, "quarter-note.svg"),
    (2, "half-note.svg"),
    (4, "whole.svg"),
    (8, "whole-two.png"),
    (12, "whole-three.png"),
    (16, "whole-four.png"),
];

/// Build the (option, icon) list for a set of granularities, sorted numerically
pub fn granularity_icons(granularities_quarters: &[u32]) -> Vec<(String, String)> {
    let mut sorted = granularities_quarters.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .into_iter()
        .map(|g| {
            let icon = KNOWN_ICONS
                .iter()
                .find(|(known, _)| *known == g)
                .map(|(_, icon)| *icon)
                .unwrap_or(DEFAULT_GRANULARITY_ICON);
            (g.to_string(), icon.to_string())
        })
        .collect()
}

/// Granularity selector (quarter-note subdivision sizes)
#[derive(Debug)]
pub struct GranularitySelect {
    select: CycleSelect,
}

impl GranularitySelect {
    pub const CONTAINER_ID: &'static str = "granularity-select-container";

    pub fn new(granularities_quarters: &[u32], icons_base: ResourceLocation) -> Result<Self, ControlError> {
        let select = CycleSelect::new(
            Self::CONTAINER_ID,
            "granularity-select",
            granularity_icons(granularities_quarters),
            icons_base,
        )?;
        Ok(Self { select })
    }

    /// Current granularity in quarter notes
    pub fn value_quarters(&self) -> u32 {
        // Options are built from u32 values so this always parses
        self.select.value().parse().unwrap_or(1)
    }

    pub fn set_value_quarters(&mut self, quarters: u32) -> Result<(), ControlError> {
        self.select.set_value(&quarters.to_string())
    }

    /// Click: cycle to the next granularity
    pub fn select_next(&mut self) -> u32 {
        self.select.select_next();
        self.value_quarters()
    }

    /// Scroll over a timestamp box: step up/down without wrapping
    pub fn step(&mut self, increase: bool) -> u32 {
        self.select.step_clamped(increase);
        self.value_quarters()
    }

    pub fn select(&self) -> &CycleSelect {
        &self.select
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base() -> ResourceLocation {
        ResourceLocation::Path(PathBuf::from("icons"))
    }

    #[test]
    fn test_icons_sorted_numerically_with_fallback() {
        let icons = granularity_icons(&[16, 2, 1, 3]);
        assert_eq!(
            icons,
            vec![
                ("1".to_string(), "quarter-note.svg".to_string()),
                ("2".to_string(), "half-note.svg".to_string()),
                ("3".to_string(), DEFAULT_GRANULARITY_ICON.to_string()),
                ("16".to_string(), "whole-four.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_initial_value_is_smallest() {
        let select = GranularitySelect::new(&[4, 2, 12], base()).unwrap();
        assert_eq!(select.value_quarters(), 2);
    }

    #[test]
    fn test_scroll_steps_clamp() {
        let mut select = GranularitySelect::new(&[1, 2, 4], base()).unwrap();
        assert_eq!(select.step(false), 1);
        assert_eq!(select.step(true), 2);
        assert_eq!(select.step(true), 4);
        assert_eq!(select.step(true), 4);
        assert_eq!(select.select_next(), 1);
    }

    #[test]
    fn test_empty_granularities_rejected() {
        assert_eq!(
            GranularitySelect::new(&[], base()).unwrap_err(),
            ControlError::EmptyOptions
        );
    }
}
