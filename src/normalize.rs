//! 課程時間欄位的文字正規化
//!
//! 課程查詢系統的節次欄位長這樣（title 屬性，多節以換行串接）:
//!
//! ```text
//! 節08(15:40~16:30)
//! 節09(16:40~17:30)
//! ```
//!
//! 節次本身（textContent）則是 `節05~節07` 或單節的 `節03`。
//! 這裡的函式全部是純函式，對格式不完整的輸入回傳空字串，不會 panic。

/// 上課起訖時間 (HH:MM)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

/// 上課起訖節次（字串，數值轉換在組裝課程時進行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRange {
    pub start_period: String,
    pub end_period: String,
}

/// 從節次描述取出起訖時間
///
/// 起：第一個 `(` 到第一個 `~` 之間；訖：最後一個 `~` 到最後一個 `)` 之間。
/// 多節輸入因此取得整段連續節次的外包絡（第一節的開始、最後一節的結束），
/// 單節輸入為退化情形（首尾重合）。缺少分隔符的那一端回傳空字串。
pub fn sanitize_time(raw: &str) -> TimeRange {
    let stripped = raw.replace('節', "");

    let start_time = match (stripped.find('('), stripped.find('~')) {
        (Some(open), Some(tilde)) if open < tilde => stripped[open + 1..tilde].to_string(),
        _ => String::new(),
    };

    let end_time = match (stripped.rfind('~'), stripped.rfind(')')) {
        (Some(tilde), Some(close)) if tilde < close => stripped[tilde + 1..close].to_string(),
        _ => String::new(),
    };

    TimeRange {
        start_time,
        end_time,
    }
}

/// 從節次文字取出起訖節次
///
/// 沒有 `~` 時視為單節課，起訖相同。
pub fn sanitize_period(raw: &str) -> PeriodRange {
    let stripped = raw.replace('節', "");

    match stripped.split_once('~') {
        Some((start, end)) => PeriodRange {
            start_period: start.to_string(),
            end_period: end.to_string(),
        },
        None => PeriodRange {
            start_period: stripped.clone(),
            end_period: stripped,
        },
    }
}

/// 星期標籤對應 1 (週一) 到 7 (週日)
///
/// 無法辨識的標籤（含空字串）回傳 0，呼叫端把 0 當作「未知」而非錯誤。
pub fn weekday_num(label: &str) -> i64 {
    match label {
        "週一" => 1,
        "週二" => 2,
        "週三" => 3,
        "週四" => 4,
        "週五" => 5,
        "週六" => 6,
        "週日" => 7,
        _ => 0,
    }
}
