use async_trait::async_trait;
use tracing::warn;

use crate::course::Course;
use crate::error::CrawlError;

#[async_trait]
pub trait Crawler: Send + Sync {
    /// 瀏覽器初始化
    async fn initialize(&mut self) -> Result<(), CrawlError>;

    /// 執行課程抓取（semester 為 None 時選最新學期）
    async fn crawl(&mut self, semester: Option<&str>) -> Result<Vec<Course>, CrawlError>;

    /// 資源釋放
    async fn close(&mut self) -> Result<(), CrawlError>;

    /// 一次執行（initialize → crawl → close）
    ///
    /// 不論成功或失敗都會呼叫 `close`，包含 `SemesterNotFound` 與逾時，
    /// 確保瀏覽器資源在每一條離開路徑上都被釋放。
    async fn run(&mut self, semester: Option<&str>) -> Result<Vec<Course>, CrawlError> {
        let result = match self.initialize().await {
            Ok(()) => self.crawl(semester).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.close().await {
            warn!("釋放瀏覽器資源失敗: {}", e);
        }

        result
    }
}
