use std::sync::Arc;

use aimg_core::config::AsciiConfig;
use anyhow::Result;
use arc_swap::ArcSwap;
use clap::Parser;

pub mod app;
pub mod cli;
pub mod hotreload;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    let source = cli.source()?;

    // 4. Charger la config + overrides CLI
    let overrides = cli.overrides();
    let config = resolve_config(&cli, &overrides)?;

    // 5. Publier rampe et police
    aimg_engine::init(&config)?;

    let max_side = config.preview_max_size;
    let config = Arc::new(ArcSwap::from_pointee(config));

    // 6. Hot-reload (seulement si le fichier existe)
    let _watcher = if cli.config.exists() {
        match hotreload::spawn_config_watcher(&cli.config, &config, overrides) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Hot-reload indisponible : {e:#}");
                None
            }
        }
    } else {
        None
    };

    // 7. Ouvrir la source
    let media = match source {
        cli::SourceArg::Image(ref path) => {
            app::Media::Still(Arc::new(aimg_source::load_image(path)?))
        }
        cli::SourceArg::Video(ref path) => {
            app::Media::Video(aimg_source::VideoPlayer::open(path, max_side)?)
        }
    };

    // 8. Terminal + boucle principale
    let result = app::App::new(config, media, source.display_name()).and_then(|mut app| {
        let terminal = ratatui::init();
        let result = app.run(terminal);
        // Restaurer le terminal (TOUJOURS, même en cas d'erreur)
        ratatui::restore();
        result
    });

    aimg_engine::teardown();
    result
}

fn resolve_config(cli: &cli::Cli, overrides: &cli::Overrides) -> Result<AsciiConfig> {
    let mut config = if cli.config.exists() {
        aimg_core::config::load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        AsciiConfig::default()
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
