//! 北護 (NTUNHS) 課程查詢系統爬蟲服務
//!
//! - 以 headless Chromium 抓取課程查詢頁面，整理成固定型別的課程紀錄
//! - 以 (semester, courseFullID) 為自然鍵 upsert 進 SQLite
//! - 提供多條件過濾 + seek pagination 的課程搜尋
//!
//! # 爬蟲使用例
//!
//! ```rust,ignore
//! use ntunhs_course_service::{CourseCrawler, Crawler, CrawlerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CrawlerConfig::new().with_headless(true);
//!     let mut crawler = CourseCrawler::new(config);
//!
//!     // 不指定學期時抓最新學期；瀏覽器在任何結果下都會被釋放
//!     let courses = crawler.run(Some("1141")).await.unwrap();
//!     println!("抓到 {} 筆課程", courses.len());
//! }
//! ```
//!
//! # 搜尋使用例
//!
//! ```rust,ignore
//! use ntunhs_course_service::{CourseStore, SearchParams};
//!
//! let store = CourseStore::open("./courses.db").unwrap();
//! let page = store
//!     .search(
//!         &SearchParams::new()
//!             .with_semesters(vec![1142])
//!             .with_day_nums(vec![2])
//!             .with_course_name("大數據"),
//!     )
//!     .unwrap();
//! println!("{} 筆, 下一頁游標 {:?}", page.data.len(), page.pagination.next_cursor);
//! ```

pub mod browser;
pub mod config;
pub mod course;
pub mod error;
pub mod normalize;
pub mod service;
pub mod store;
pub mod traits;

// 主要型別 re-export
pub use config::CrawlerConfig;
pub use course::{Course, CourseCrawler};
pub use error::CrawlError;
pub use normalize::{sanitize_period, sanitize_time, weekday_num, PeriodRange, TimeRange};
pub use service::{CrawlOutcome, CrawlRequest, CrawlService};
pub use store::{CourseRow, CourseStore, Pagination, SearchPage, SearchParams};
pub use traits::Crawler;
