//! Static resource resolution
//!
//! Icons and other bundled assets live in a `static/` directory when the
//! application is packaged, and are served over HTTP by a development server
//! while iterating on the UI. [`StaticResources`] hides the difference.

use std::path::{Path, PathBuf};

/// Environment variable pointing at a development server serving `static/`
pub const DEV_SERVER_ENV: &str = "NONOTO_DEV_SERVER";

/// Where static resources come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Resources shipped next to the executable (or in an override directory)
    Packaged { static_dir: PathBuf },
    /// Resources served by a development server
    DevServer { base_url: String },
}

/// A resolved resource location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    Path(PathBuf),
    Url(String),
}

impl ResourceLocation {
    /// File-system path, if the resource is local
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Url(_) => None,
        }
    }

    /// Append a path segment to this location
    pub fn join(&self, name: &str) -> Self {
        match self {
            Self::Path(p) => Self::Path(p.join(name)),
            Self::Url(u) => Self::Url(format!("{}/{}", u.trim_end_matches('/'), name)),
        }
    }
}

/// Maps logical resource names to paths or URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResources {
    mode: ExecutionMode,
}

impl StaticResources {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    /// Pick the execution mode
    ///
    /// An explicit override directory wins, then [`DEV_SERVER_ENV`], then the
    /// `static/` directory next to the running executable.
    pub fn detect(static_dir_override: Option<&Path>) -> Self {
        if let Some(dir) = static_dir_override {
            log::info!("Resources: Using static directory override {:?}", dir);
            return Self::new(ExecutionMode::Packaged {
                static_dir: dir.to_path_buf(),
            });
        }

        if let Ok(base_url) = std::env::var(DEV_SERVER_ENV) {
            if !base_url.is_empty() {
                log::info!("Resources: Serving static files from dev server {}", base_url);
                return Self::new(ExecutionMode::DevServer { base_url });
            }
        }

        let static_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("static")))
            .unwrap_or_else(|| PathBuf::from("static"));
        log::info!("Resources: Using packaged static directory {:?}", static_dir);
        Self::new(ExecutionMode::Packaged { static_dir })
    }

    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    /// Resolve a logical resource name (e.g. `"icons"`)
    pub fn resolve(&self, name: &str) -> ResourceLocation {
        match &self.mode {
            ExecutionMode::Packaged { static_dir } => ResourceLocation::Path(static_dir.join(name)),
            ExecutionMode::DevServer { base_url } => {
                ResourceLocation::Url(format!("{}/{}", base_url.trim_end_matches('/'), name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packaged_resolves_to_path() {
        let resources = StaticResources::new(ExecutionMode::Packaged {
            static_dir: PathBuf::from("/opt/nonoto/static"),
        });
        let icons = resources.resolve("icons");
        assert_eq!(icons, ResourceLocation::Path(PathBuf::from("/opt/nonoto/static/icons")));
        assert_eq!(
            icons.join("whole.svg").as_path(),
            Some(Path::new("/opt/nonoto/static/icons/whole.svg"))
        );
    }

    #[test]
    fn test_dev_server_resolves_to_url() {
        let resources = StaticResources::new(ExecutionMode::DevServer {
            base_url: "http://localhost:9080/".to_string(),
        });
        let icon = resources.resolve("icons").join("half-note.svg");
        assert_eq!(icon, ResourceLocation::Url("http://localhost:9080/icons/half-note.svg".to_string()));
        assert!(icon.as_path().is_none());
    }

    #[test]
    fn test_override_wins() {
        let resources = StaticResources::detect(Some(Path::new("/tmp/static")));
        assert_eq!(
            resources.mode(),
            &ExecutionMode::Packaged {
                static_dir: PathBuf::from("/tmp/static")
            }
        );
    }
}
