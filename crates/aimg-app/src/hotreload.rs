use std::path::Path;
use std::sync::Arc;

use aimg_core::config::{AsciiConfig, load_config};
use anyhow::Result;
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::cli::Overrides;

/// Relit `path` et réapplique les overrides CLI.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or validated.
pub fn reload(path: &Path, overrides: &Overrides) -> Result<AsciiConfig> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Surveille le fichier config et publie chaque version valide dans l'ArcSwap.
///
/// Retourne le Watcher (doit rester vivant tant que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher(
    config_path: &Path,
    config: &Arc<ArcSwap<AsciiConfig>>,
    overrides: Overrides,
) -> Result<impl Watcher + use<>> {
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let Ok(event) = res else {
            return;
        };
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        match reload(&path, &overrides) {
            Ok(new_config) => {
                config.store(Arc::new(new_config));
                log::info!("Config rechargée depuis {}", path.display());
            }
            // On garde l'ancienne config.
            Err(e) => log::warn!("Erreur de rechargement config : {e:#}"),
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reload_merges_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ascii.toml");
        fs::write(&path, "[engine]\nmax_output_size = 40\ninvert = false\n").unwrap();

        let overrides = Overrides {
            invert: true,
            ..Overrides::default()
        };
        let config = reload(&path, &overrides).unwrap();
        assert_eq!(config.max_output_size, 40);
        assert!(config.invert);
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ascii.toml");
        fs::write(&path, "[video]\nframe_rate = 0.0\n").unwrap();
        assert!(reload(&path, &Overrides::default()).is_err());
    }

    #[test]
    fn watcher_starts_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ascii.toml");
        fs::write(&path, "").unwrap();
        let shared = Arc::new(ArcSwap::from_pointee(AsciiConfig::default()));
        assert!(spawn_config_watcher(&path, &shared, Overrides::default()).is_ok());
    }
}
