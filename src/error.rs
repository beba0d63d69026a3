use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("瀏覽器初始化錯誤: {0}")]
    BrowserInit(String),

    #[error("頁面導覽錯誤: {0}")]
    Navigation(String),

    #[error("JavaScript 執行錯誤: {0}")]
    JavaScript(String),

    #[error("找不到元素: {0}")]
    ElementNotFound(String),

    #[error("指定的學期 {0} 不存在")]
    SemesterNotFound(String),

    #[error("逾時: {0}")]
    Timeout(String),

    #[error("課程解析錯誤: {0}")]
    Extraction(String),

    #[error("JSON 解析錯誤: {0}")]
    Json(String),

    #[error("資料庫錯誤: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("檔案操作錯誤: {0}")]
    FileIO(#[from] std::io::Error),
}

impl CrawlError {
    /// 呼叫端輸入造成的錯誤（學期代碼不在選單中）
    pub fn is_client_fault(&self) -> bool {
        matches!(self, CrawlError::SemesterNotFound(_))
    }

    /// 遠端站台逾時（與輸入錯誤區分，供呼叫端判斷）
    pub fn is_timeout(&self) -> bool {
        matches!(self, CrawlError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let not_found = CrawlError::SemesterNotFound("9999".to_string());
        assert!(not_found.is_client_fault());
        assert!(!not_found.is_timeout());
        assert!(not_found.to_string().contains("9999"));

        let timeout = CrawlError::Timeout("課程表格在 60 秒內未載入".to_string());
        assert!(timeout.is_timeout());
        assert!(!timeout.is_client_fault());

        let unknown = CrawlError::Navigation("net::ERR_CONNECTION_RESET".to_string());
        assert!(!unknown.is_client_fault());
        assert!(!unknown.is_timeout());
    }
}
