// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "factmap";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".factmap.yaml";

/// バイナリ名
pub const BINARY_NAME: &str = "factmap";

/// ログフィルタを上書きする環境変数名
pub const LOG_ENV: &str = "FACTMAP_LOG";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        assert_eq!(APP_NAME, "factmap");
        assert_eq!(CONFIG_FILE, ".factmap.yaml");
        assert_eq!(BINARY_NAME, APP_NAME);
        assert!(LOG_ENV.starts_with("FACTMAP"));
    }
}
