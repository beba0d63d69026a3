//! 課程抓取模組
//!
//! 從北護課程查詢系統擷取課程列表並組裝成固定型別的紀錄

mod crawler;
mod types;

pub use crawler::CourseCrawler;
pub use types::Course;
