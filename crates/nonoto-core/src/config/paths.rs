//! Standard locations for nonoto configuration files

use std::path::PathBuf;

/// Get the configuration directory
///
/// Returns: `<os config dir>/nonoto` (e.g. `~/.config/nonoto` on Linux)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nonoto")
}

/// Get the default config file path for a given file name
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_app_name() {
        assert!(default_config_dir().ends_with("nonoto"));
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("config.yaml");
        assert!(path.ends_with("config.yaml"));
        assert!(path.parent().is_some_and(|p| p.ends_with("nonoto")));
    }
}
