//! Chromium 執行檔解析
//!
//! 解析順序：設定指定路徑 → `CHROME_PATH` / `CHROMIUM_PATH` 環境變數 →
//! 常見系統路徑 → chromiumoxide fetcher 自動下載。
//!
//! 下載結果以行程層級的快取保存；快取鎖在整段解析期間持有，
//! 同時只會有一個下載進行，其餘呼叫等待同一次結果。
//! 解析失敗時快取保持空的，下一次呼叫會重新嘗試而不是重播失敗。

use std::path::{Path, PathBuf};

use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::CrawlerConfig;
use crate::error::CrawlError;

static CHROME_PATH_CACHE: Mutex<Option<PathBuf>> = Mutex::const_new(None);

/// 常見的 Chromium / Chrome 安裝位置
const KNOWN_PATHS: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// 取得 Chromium 執行檔路徑
pub async fn chrome_executable(config: &CrawlerConfig) -> Result<PathBuf, CrawlError> {
    if let Some(path) = &config.chrome_path {
        return Ok(path.clone());
    }

    let mut cached = CHROME_PATH_CACHE.lock().await;
    if let Some(path) = cached.as_ref() {
        debug!("使用快取的 Chromium 路徑: {:?}", path);
        return Ok(path.clone());
    }

    let path = resolve().await?;
    *cached = Some(path.clone());
    Ok(path)
}

async fn resolve() -> Result<PathBuf, CrawlError> {
    for var in ["CHROME_PATH", "CHROMIUM_PATH"] {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                info!("使用 {} 指定的 Chromium: {}", var, value);
                return Ok(PathBuf::from(value));
            }
        }
    }

    for candidate in KNOWN_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            info!("找到系統 Chromium: {}", candidate);
            return Ok(path.to_path_buf());
        }
    }

    download().await
}

/// 透過 chromiumoxide fetcher 下載 Chromium
async fn download() -> Result<PathBuf, CrawlError> {
    let cache_dir = std::env::temp_dir().join("ntunhs-course-chromium");
    std::fs::create_dir_all(&cache_dir)?;

    info!("系統上找不到 Chromium，下載中... (目錄: {:?})", cache_dir);

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .map_err(|e| CrawlError::BrowserInit(format!("下載設定錯誤: {}", e)))?;

    let fetcher = BrowserFetcher::new(options);
    let revision = fetcher
        .fetch()
        .await
        .map_err(|e| CrawlError::BrowserInit(format!("Chromium 下載失敗: {}", e)))?;

    info!("Chromium 下載完成: {:?}", revision.executable_path);
    Ok(revision.executable_path)
}
