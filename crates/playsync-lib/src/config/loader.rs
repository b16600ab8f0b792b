use super::Config;
use crate::error::PlaysyncError;
use config::Config as ConfigBuilder;

pub fn load_config(config_path: &str) -> Result<Config, PlaysyncError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .add_source(
            config::Environment::with_prefix("PLAYSYNC")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let app_config: Config = config_builder.try_deserialize()?;
    validate_config(&app_config)?;
    Ok(app_config)
}

fn validate_config(app_config: &Config) -> Result<(), PlaysyncError> {
    if app_config.playlists.is_empty() {
        return Err(PlaysyncError::ConfigValidation {
            details: "No playlists defined in config".to_string(),
        });
    }

    for playlist in &app_config.playlists {
        url::Url::parse(playlist.url.trim()).map_err(|e| PlaysyncError::ConfigValidation {
            details: format!("Invalid playlist URL {}: {}", playlist.url, e),
        })?;
        if playlist.path.as_os_str().is_empty() {
            return Err(PlaysyncError::ConfigValidation {
                details: format!("Playlist {} has an empty output path", playlist.url),
            });
        }
    }

    Ok(())
}
