pub mod config;
pub mod narration;
pub mod notifier;
pub mod playback;
pub mod utils;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::{sync::Arc, time::Duration};

    use log::warn;
    use tauri::Manager;

    use crate::{
        config::{PanelConfig, SegmentCatalog},
        narration::NarrationHandle,
        notifier::HttpNotifier,
        playback::{
            commands::{
                get_playback_state, list_segments, reset_playback, speak_segment,
                stop_narration, trigger_segment, TauriEvents,
            },
            PlaybackCoordinator,
        },
        utils::logging,
    };

    pub(crate) struct AppState {
        pub(crate) playback: PlaybackCoordinator,
        pub(crate) narration: Option<Arc<NarrationHandle>>,
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        logging::init();

        log::info!("Omnia panel starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let config_dir = app
                        .path()
                        .app_config_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    let config_path = PanelConfig::resolve_path(config_dir.join("panel.json"));
                    let config = PanelConfig::load(&config_path)?;

                    let notifier =
                        HttpNotifier::new(Duration::from_millis(config.request_timeout_ms))?;

                    let narration = match NarrationHandle::new(&config.narration) {
                        Ok(handle) => Some(Arc::new(handle)),
                        Err(err) => {
                            warn!("Narration disabled: {:#}", err);
                            None
                        }
                    };

                    let mut playback = PlaybackCoordinator::new(
                        SegmentCatalog::from_config(&config),
                        Arc::new(notifier),
                        Arc::new(TauriEvents::new(app.handle().clone())),
                    )
                    .with_completion_webhook(config.completion_webhook.clone());

                    if config.narration.speak_on_trigger {
                        if let Some(narration) = &narration {
                            playback = playback.with_narrator(narration.clone());
                        }
                    }

                    app.manage(AppState {
                        playback,
                        narration,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                get_playback_state,
                trigger_segment,
                reset_playback,
                list_segments,
                speak_segment,
                stop_narration,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}

#[cfg(feature = "desktop")]
pub(crate) use desktop::AppState;
