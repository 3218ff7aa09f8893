use std::path::PathBuf;

/// Directory name shared by the config, data and cache locations.
const APP_DIR: &str = "ytmd-deck";

/// The host always listens on loopback.
pub const HOST_WS_ADDRESS: &str = "127.0.0.1";

pub fn host_ws_url(port: u16) -> String {
    format!("ws://{}:{}", HOST_WS_ADDRESS, port)
}

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/ytmd-deck/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(temp_dir)
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    // The host launches plugins from their bundle directory; a config.toml
    // shipped beside the executable wins over the per-user one.
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if exe_dir.join("config.toml").exists() {
                return exe_dir.to_path_buf();
            }
        }
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

pub fn log_path() -> PathBuf {
    data_dir().join("plugin.log")
}
