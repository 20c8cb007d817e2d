pub mod merged;
pub mod settings;
pub mod trim;

use std::path::Path;

use settings::Settings;

/// 作業ディレクトリから settings.yaml を自動検出して読み込む。
///
/// `dir/settings.yaml` が存在すれば読み込み、存在しなければ
/// デフォルト設定を返す。
pub fn load_settings(dir: &Path) -> crate::error::Result<Settings> {
    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
