use std::path::PathBuf;
use std::time::Duration;

/// 課程查詢頁面 (ASP.NET WebForms)
pub const QUERY_COURSE_URL: &str =
    "https://system10.ntunhs.edu.tw/AcadInfoSystem/Modules/QueryCourse/QueryCourse.aspx";

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub query_url: String,
    /// 查詢結果表格的等待上限
    pub table_timeout: Duration,
    pub headless: bool,
    pub debug: bool,
    /// 指定 Chromium 執行檔；None 時走 env/系統路徑/自動下載
    pub chrome_path: Option<PathBuf>,
    /// 送出查詢前輸入的課程名稱（縮小查詢範圍用）
    pub course_name: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            query_url: QUERY_COURSE_URL.to_string(),
            table_timeout: Duration::from_secs(60),
            headless: true,
            debug: false,
            chrome_path: None,
            course_name: None,
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query_url(mut self, url: impl Into<String>) -> Self {
        self.query_url = url.into();
        self
    }

    pub fn with_table_timeout(mut self, timeout: Duration) -> Self {
        self.table_timeout = timeout;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_course_name(mut self, name: impl Into<String>) -> Self {
        self.course_name = Some(name.into());
        self
    }
}
