pub mod settings;

use settings::Settings;
use std::path::Path;

/// Default settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// 設定ファイルを読み込む。
///
/// 明示的なパスが指定されていればそれを読み込む（存在しなければエラー）。
/// 指定がなければカレントディレクトリの `settings.yaml` を探し、
/// 存在しなければデフォルト設定を返す。
pub fn load_settings(explicit: Option<&Path>) -> crate::error::Result<Settings> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(crate::error::PdfEditError::config(format!(
                "settings file not found: {}",
                path.display()
            )));
        }
        return Settings::from_file(path);
    }

    let default_path = Path::new(SETTINGS_FILE);
    if default_path.exists() {
        Settings::from_file(default_path)
    } else {
        Ok(Settings::default())
    }
}
