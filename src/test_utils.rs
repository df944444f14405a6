//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::path::Path;

use tempfile::TempDir;

/// プロジェクトルートからの相対パスにファイルを書き込む（親ディレクトリも作成する）
pub(crate) fn write_file(root: &Path, relative_path: &str, content: &str) {
    let path = root.join(relative_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// 定義ファイル 1 つと翻訳ファイル 2 つ（fr, ja）を持つテスト用プロジェクトを作成する
pub(crate) fn write_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/Greeting.messages.js",
        "export default defineMessages({ GREETING: 'Hello, {name}' });",
    );
    write_file(dir.path(), "src/messages/fr.messages.json", r#"{"GREETING": "Bonjour {name}"}"#);
    write_file(dir.path(), "src/messages/ja.messages.json", r#"{"GREETING": "こんにちは、{name}"}"#);
    dir
}
