use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::config::CrawlerConfig;
use crate::course::{Course, CourseCrawler};
use crate::error::CrawlError;
use crate::store::CourseStore;
use crate::traits::Crawler;

/// 課程爬蟲請求
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// 學期代碼（例如 "1141"）；None 時抓最新學期
    pub semester: Option<String>,
    /// 查詢前輸入的課程名稱（縮小查詢範圍）
    pub course_name: Option<String>,
    pub headless: bool,
    pub debug: bool,
}

impl CrawlRequest {
    pub fn new() -> Self {
        Self {
            semester: None,
            course_name: None,
            headless: true,
            debug: false,
        }
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = Some(semester.into());
        self
    }

    pub fn with_course_name(mut self, name: impl Into<String>) -> Self {
        self.course_name = Some(name.into());
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
}

impl From<&CrawlRequest> for CrawlerConfig {
    fn from(req: &CrawlRequest) -> Self {
        let mut config = CrawlerConfig::new()
            .with_headless(req.headless)
            .with_debug(req.debug);

        if let Some(name) = &req.course_name {
            config = config.with_course_name(name.clone());
        }

        config
    }
}

/// 課程爬蟲結果
#[derive(Debug)]
pub struct CrawlOutcome {
    pub courses: Vec<Course>,
    /// 有掛資料庫時為寫入筆數；純抓取時為 None
    pub upserted: Option<usize>,
}

/// 實作 tower::Service 的課程爬蟲服務
///
/// 不掛資料庫時只抓取回傳；以 `with_store` 建立時，
/// 抓取結果會一併 upsert 進課程資料庫。
#[derive(Clone, Default)]
pub struct CrawlService {
    store: Option<Arc<CourseStore>>,
}

impl CrawlService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<CourseStore>) -> Self {
        Self { store: Some(store) }
    }
}

impl Service<CrawlRequest> for CrawlService {
    type Response = CrawlOutcome;
    type Error = CrawlError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        info!("收到課程爬蟲請求: semester={:?}", req.semester);

        let store = self.store.clone();

        Box::pin(async move {
            let semester = req.semester.clone();
            let config = CrawlerConfig::from(&req);

            let mut crawler = CourseCrawler::new(config);
            let courses = crawler.run(semester.as_deref()).await?;

            let upserted = match &store {
                Some(store) => Some(store.upsert_courses(&courses)?),
                None => None,
            };

            info!(
                "爬蟲完成: {} 筆課程, 寫入={:?}",
                courses.len(),
                upserted
            );

            Ok(CrawlOutcome { courses, upserted })
        })
    }
}
