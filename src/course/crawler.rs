//! 課程爬蟲實作
//!
//! 流程：前往查詢頁 → 選擇學期 → 送出查詢 → 等待結果表格 → 逐 group 擷取。
//!
//! 查詢系統為了排版會把一門課拆成多個實體 `<tr>`，同一門課的列共用
//! `group` 屬性，所以擷取以 group 為單位：先收集出現順序不重複的
//! group 清單，再對每個 group 的代表列讀取固定欄位表。

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use chrono::{offset::FixedOffset, Utc};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::chrome_executable;
use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::traits::Crawler;

use super::types::{Course, RawCourseRow};

/// 學期下拉選單
const SEMESTER_SELECT: &str = "#ContentPlaceHolder1_ddlSem";
/// 課程名稱輸入欄
const COURSE_NAME_INPUT: &str = "#ContentPlaceHolder1_txtCourseName";
/// 查詢按鈕
const QUERY_BUTTON: &str = "#ContentPlaceHolder1_btnQuery";
/// 查詢結果表格
const RESULT_TABLE: &str = "#ContentPlaceHolder1_NewGridView";

/// 學期選單出現的等待上限（秒）
const SELECT_WAIT_SECS: u64 = 10;

/// 欄位擷取表（textContent）：JSON 鍵 → 欄位元素 id 的識別標記
const TEXT_FIELDS: &[(&str, &str)] = &[
    ("semester", "lblSEMNo"),
    ("department", "lblGroupName"),
    ("courseType", "lblCourseTypeName"),
    ("courseFullID", "hidCOURSEFULLNO"),
    ("courseName", "lblCourseName"),
    ("courseEngName", "hidECOURSENAME"),
    ("departmentID", "hidGROUPNO"),
    ("subjectID", "lblCourseNo"),
    ("subjectGroup", "hidCOURSEGROUP"),
    ("grade", "lblGrade"),
    ("classGroup", "lblClass"),
    ("credit", "lblCredit"),
    ("className", "hidCLASSNAME"),
    ("classID", "hidCLASSNO"),
    ("totalOfTakingStudents", "hidTOTALFULLCNT"),
    ("numberOfTakingStudents", "lblTotalCNT"),
    ("weekNumber", "hidWEEKDESC"),
    ("courseAbstract", "hidABSTRACT"),
    ("courseEngAbstract", "hidEABSTRACT"),
    ("roomNo", "lblRoomNo"),
    ("period", "lblSecNo"),
];

/// 欄位擷取表（title 屬性）
const TITLE_FIELDS: &[(&str, &str)] = &[
    ("note", "lblRemark"),
    ("day", "lblWeekNo"),
    ("roomTitle", "lblRoomNo"),
    ("periodTime", "lblSecNo"),
];

/// 收集表格中所有 group 識別碼（首次出現順序，不重複）
const GROUP_IDS_SCRIPT: &str = r#"
    (() => {
        const rows = document.querySelectorAll('#ContentPlaceHolder1_NewGridView tr');
        const seen = [];
        for (const tr of rows) {
            const group = tr.getAttribute('group');
            if (group && !seen.includes(group)) seen.push(group);
        }
        return JSON.stringify(seen);
    })()
"#;

/// 讀取學期選單的所有 option value；選單不存在時回傳 null
const SEMESTER_OPTIONS_SCRIPT: &str = r#"
    (() => {
        const select = document.querySelector('#ContentPlaceHolder1_ddlSem');
        if (!select) return null;
        return JSON.stringify(Array.from(select.options).map((opt) => opt.value));
    })()
"#;

/// 北護課程查詢爬蟲
pub struct CourseCrawler {
    config: CrawlerConfig,
    browser: Option<Browser>,
    page: Option<Arc<Page>>,
}

impl CourseCrawler {
    pub fn new(config: CrawlerConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
        }
    }

    fn get_page(&self) -> Result<&Arc<Page>, CrawlError> {
        self.page
            .as_ref()
            .ok_or_else(|| CrawlError::BrowserInit("瀏覽器尚未初始化".into()))
    }

    /// 讀取學期選單的 option value 清單
    async fn semester_options(&self, page: &Page) -> Result<Vec<String>, CrawlError> {
        let result = page
            .evaluate(SEMESTER_OPTIONS_SCRIPT)
            .await
            .map_err(|e| CrawlError::JavaScript(e.to_string()))?;

        let json = result
            .into_value::<Option<String>>()
            .map_err(|e| CrawlError::Json(e.to_string()))?
            .ok_or_else(|| {
                CrawlError::ElementNotFound(format!("學期下拉選單 ({})", SEMESTER_SELECT))
            })?;

        serde_json::from_str(&json).map_err(|e| CrawlError::Json(e.to_string()))
    }

    /// 選擇學期
    ///
    /// 有指定學期時先驗證該代碼存在於選單中，不存在即回報
    /// `SemesterNotFound`，查詢不會送出。未指定時選最新學期
    /// （第一個選項是「請選擇學期...」占位，最新的在第二個）。
    async fn select_semester(
        &self,
        page: &Page,
        semester: Option<&str>,
    ) -> Result<(), CrawlError> {
        let mut found = false;
        for _ in 0..SELECT_WAIT_SECS {
            let ready = page
                .evaluate("document.querySelector('#ContentPlaceHolder1_ddlSem') !== null")
                .await
                .map_err(|e| CrawlError::JavaScript(e.to_string()))?;

            if ready.into_value::<bool>().unwrap_or(false) {
                found = true;
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }

        if !found {
            return Err(CrawlError::ElementNotFound(format!(
                "學期下拉選單 ({})",
                SEMESTER_SELECT
            )));
        }

        let options = self.semester_options(page).await?;
        let target = resolve_semester_target(&options, semester)?;

        info!("選擇學期: {}", target);

        let script = select_semester_script(&target)?;
        page.evaluate(script.as_str())
            .await
            .map_err(|e| CrawlError::JavaScript(e.to_string()))?;

        Ok(())
    }

    /// 等待查詢結果表格出現，逾時回報 Timeout
    async fn wait_for_table(&self, page: &Page) -> Result<(), CrawlError> {
        let timeout = self.config.table_timeout;
        let start = Instant::now();
        info!("等待查詢結果表格載入 (上限 {} 秒)...", timeout.as_secs());

        loop {
            // 送出查詢後頁面會整頁 postback，期間的檢查失敗視為「還沒載入」
            let present = match page
                .evaluate("document.querySelector('#ContentPlaceHolder1_NewGridView') !== null")
                .await
            {
                Ok(result) => result.into_value::<bool>().unwrap_or(false),
                Err(e) => {
                    debug!("表格檢查失敗（頁面可能在轉址中）: {}", e);
                    false
                }
            };

            if present {
                info!("查詢結果表格已載入 ({:?})", start.elapsed());
                return Ok(());
            }

            if start.elapsed() > timeout {
                if self.config.debug {
                    self.debug_screenshot(page).await;
                }
                return Err(CrawlError::Timeout(format!(
                    "課程表格 ({}) 在 {} 秒內未載入",
                    RESULT_TABLE,
                    timeout.as_secs()
                )));
            }

            sleep(Duration::from_secs(1)).await;
        }
    }

    /// 逐 group 擷取課程
    ///
    /// 單一 group 解析失敗只記 log 並跳過，不中斷整批；
    /// 部分成功（N/M 筆）對呼叫端而言仍是成功。
    async fn extract_courses(&self, page: &Page) -> Result<Vec<Course>, CrawlError> {
        let result = page
            .evaluate(GROUP_IDS_SCRIPT)
            .await
            .map_err(|e| CrawlError::JavaScript(e.to_string()))?;

        let json = result
            .into_value::<String>()
            .map_err(|e| CrawlError::Json(e.to_string()))?;
        let groups: Vec<String> =
            serde_json::from_str(&json).map_err(|e| CrawlError::Json(e.to_string()))?;

        info!("查詢結果共有 {} 個課程 group", groups.len());

        let mut courses = Vec::with_capacity(groups.len());
        for group in &groups {
            match self.capture_group(page, group).await {
                Ok(raw) => courses.push(Course::from_raw(raw)),
                Err(e) => warn!("解析課程失敗 (group: {}): {}", group, e),
            }
        }

        info!("成功擷取 {}/{} 筆課程", courses.len(), groups.len());
        Ok(courses)
    }

    /// 擷取單一 group 的原始欄位
    ///
    /// 代表列本身不存在才算結構性失敗；列內個別欄位缺漏由
    /// `Course::from_raw` 以預設值處理。
    async fn capture_group(&self, page: &Page, group: &str) -> Result<RawCourseRow, CrawlError> {
        let script = group_capture_script(group)?;
        let result = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| CrawlError::JavaScript(e.to_string()))?;

        let json = result
            .into_value::<Option<String>>()
            .map_err(|e| CrawlError::Json(e.to_string()))?
            .ok_or_else(|| {
                CrawlError::Extraction(format!("找不到 group {} 的資料列", group))
            })?;

        serde_json::from_str(&json).map_err(|e| CrawlError::Json(e.to_string()))
    }

    /// 逾時當下的頁面截圖（除錯用，失敗不影響流程）
    async fn debug_screenshot(&self, page: &Page) {
        if let Ok(screenshot) = page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
            debug!("逾時當下頁面截圖: data:image/png;base64,{}", encoded);
        }
    }

    /// 把抓到的課程另存一份 JSON（除錯模式）
    async fn save_courses_json(&self, courses: &[Course]) {
        let taipei = FixedOffset::east_opt(8 * 3600).unwrap();
        let timestamp = Utc::now().with_timezone(&taipei).format("%Y%m%d_%H%M%S");
        let filename = format!("./data/courses_{}.json", timestamp);

        if let Err(e) = std::fs::create_dir_all("./data") {
            warn!("建立 data 目錄失敗: {}", e);
            return;
        }

        match serde_json::to_string_pretty(courses) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&filename, json) {
                    error!("寫入課程資料失敗: {}", e);
                } else {
                    info!("課程資料已存至 {}", filename);
                }
            }
            Err(e) => error!("序列化課程資料失敗: {}", e),
        }
    }
}

#[async_trait]
impl Crawler for CourseCrawler {
    async fn initialize(&mut self) -> Result<(), CrawlError> {
        info!("初始化瀏覽器...");

        let executable = chrome_executable(&self.config).await?;

        // 每次啟動用獨立的 user data 目錄，避免多行程互踩
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("ntunhs-course-{}", unique_id));

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--lang=zh-TW");

        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(CrawlError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlError::BrowserInit(e.to_string()))?;

        // 瀏覽器事件處理迴圈
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::BrowserInit(e.to_string()))?;

        self.browser = Some(browser);
        self.page = Some(Arc::new(page));

        info!("瀏覽器初始化完成");
        Ok(())
    }

    async fn crawl(&mut self, semester: Option<&str>) -> Result<Vec<Course>, CrawlError> {
        let page = self.get_page()?.clone();

        info!("前往課程查詢頁面: {}", self.config.query_url);
        page.goto(&self.config.query_url)
            .await
            .map_err(|e| CrawlError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| CrawlError::Navigation(e.to_string()))?;

        self.select_semester(&page, semester).await?;

        // 有設定課程名稱時先輸入，縮小查詢範圍
        if let Some(name) = &self.config.course_name {
            info!("輸入課程名稱: {}", name);
            page.find_element(COURSE_NAME_INPUT)
                .await
                .map_err(|e| {
                    CrawlError::ElementNotFound(format!("課程名稱輸入欄: {}", e))
                })?
                .type_str(name)
                .await
                .map_err(|e| CrawlError::JavaScript(format!("課程名稱輸入: {}", e)))?;
        }

        info!("送出查詢");
        page.find_element(QUERY_BUTTON)
            .await
            .map_err(|e| CrawlError::ElementNotFound(format!("查詢按鈕: {}", e)))?
            .click()
            .await
            .map_err(|e| CrawlError::Navigation(format!("查詢按鈕點擊: {}", e)))?;

        self.wait_for_table(&page).await?;

        let courses = self.extract_courses(&page).await?;

        if self.config.debug {
            self.save_courses_json(&courses).await;
        }

        Ok(courses)
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        self.page = None;
        self.browser = None;
        Ok(())
    }
}

/// 決定要選取的學期
///
/// 有指定學期就驗證該代碼在選單裡，不在即為 `SemesterNotFound`；
/// 沒指定則取占位選項「請選擇學期...」之後的第一個（最新學期）。
fn resolve_semester_target(
    options: &[String],
    requested: Option<&str>,
) -> Result<String, CrawlError> {
    match requested {
        Some(code) => {
            if !options.iter().any(|value| value == code) {
                return Err(CrawlError::SemesterNotFound(code.to_string()));
            }
            Ok(code.to_string())
        }
        None => options
            .get(1)
            .cloned()
            .ok_or_else(|| CrawlError::Extraction("學期選單沒有可選的學期".to_string())),
    }
}

/// 產生選擇學期的 JavaScript（觸發 change 讓 WebForms 注意到變更）
fn select_semester_script(value: &str) -> Result<String, CrawlError> {
    let value_json = serde_json::to_string(value).map_err(|e| CrawlError::Json(e.to_string()))?;

    Ok(format!(
        r#"
        (() => {{
            const select = document.querySelector('#ContentPlaceHolder1_ddlSem');
            select.value = {value};
            select.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()
        "#,
        value = value_json,
    ))
}

/// 產生擷取單一 group 欄位的 JavaScript
///
/// 欄位表以 JSON 內嵌；代表列不存在回傳 null（結構性失敗），
/// 個別欄位元素不存在時該鍵為 null（缺漏，不是錯誤）。
fn group_capture_script(group: &str) -> Result<String, CrawlError> {
    let group_json = serde_json::to_string(group).map_err(|e| CrawlError::Json(e.to_string()))?;
    let text_table =
        serde_json::to_string(TEXT_FIELDS).map_err(|e| CrawlError::Json(e.to_string()))?;
    let title_table =
        serde_json::to_string(TITLE_FIELDS).map_err(|e| CrawlError::Json(e.to_string()))?;

    Ok(format!(
        r#"
        (() => {{
            const tr = document.querySelector(
                '#ContentPlaceHolder1_NewGridView tr[group="' + {group} + '"]');
            if (!tr) return null;

            const pick = (marker) => tr.querySelector('span[id*="' + marker + '"]');

            const fields = {{}};
            for (const [key, marker] of {text_table}) {{
                const el = pick(marker);
                fields[key] = el ? (el.textContent || '').trim() : null;
            }}
            for (const [key, marker] of {title_table}) {{
                const el = pick(marker);
                fields[key] = el ? (el.title || '').trim() : null;
            }}

            const names = (marker) =>
                Array.from(tr.querySelectorAll('div[id*="' + marker + '"] span'))
                    .map((el) => (el.textContent || '').trim())
                    .filter((name) => name.length > 0);
            fields.mainTeacherNames = names('panMainTeachNameLinks');
            fields.multipleTeacherNames = names('panMultipleTeachNameLinks');

            return JSON.stringify(fields);
        }})()
        "#,
        group = group_json,
        text_table = text_table,
        title_table = title_table,
    ))
}
