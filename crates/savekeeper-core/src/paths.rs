use std::env;
use std::path::PathBuf;

/// Directory name used under the platform data root.
pub const APP_DIR_NAME: &str = "savekeeper";

/// Return the user's home directory path.
///
/// Uses HOME on Unix-like systems and USERPROFILE on Windows.
pub fn get_home_dir() -> Result<String, String> {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Ok(home);
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.is_empty() {
            return Ok(profile);
        }
    }

    Err("Home directory not set".to_string())
}

/// Default persistent directory for profile save files.
///
/// `$HOME/.local/share/savekeeper`, falling back to a relative
/// `savekeeper` directory when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    match get_home_dir() {
        Ok(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME),
        Err(e) => {
            log::warn!("{e}, using ./{APP_DIR_NAME} for save files");
            PathBuf::from(APP_DIR_NAME)
        }
    }
}
