//! 課程紀錄型別
//!
//! `RawCourseRow` 是從查詢結果表格單一 group 擷取下來的原始欄位
//! （全部可缺漏），`Course` 則是完成數值轉換後的固定型別紀錄。
//! 所有「欄位缺漏 → 預設值」的規則集中在 [`Course::from_raw`]。

use serde::{Deserialize, Serialize};

use crate::normalize::{sanitize_period, sanitize_time, weekday_num};

/// 表格 group 的原始擷取結果
///
/// 欄位名稱對應頁面 JavaScript 擷取時輸出的 JSON 鍵。
/// 欄位元素不存在時值為 null，這裡一律以 `Option` 承接，不視為錯誤。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCourseRow {
    pub semester: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "courseType")]
    pub course_type: Option<String>,
    #[serde(rename = "courseFullID")]
    pub course_full_id: Option<String>,
    #[serde(rename = "courseName")]
    pub course_name: Option<String>,
    #[serde(rename = "courseEngName")]
    pub course_eng_name: Option<String>,
    #[serde(rename = "departmentID")]
    pub department_id: Option<String>,
    #[serde(rename = "subjectID")]
    pub subject_id: Option<String>,
    #[serde(rename = "subjectGroup")]
    pub subject_group: Option<String>,
    pub grade: Option<String>,
    #[serde(rename = "classGroup")]
    pub class_group: Option<String>,
    pub credit: Option<String>,
    #[serde(rename = "className")]
    pub class_name: Option<String>,
    #[serde(rename = "classID")]
    pub class_id: Option<String>,
    #[serde(rename = "totalOfTakingStudents")]
    pub total_of_taking_students: Option<String>,
    #[serde(rename = "numberOfTakingStudents")]
    pub number_of_taking_students: Option<String>,
    #[serde(rename = "weekNumber")]
    pub week_number: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "courseAbstract")]
    pub course_abstract: Option<String>,
    #[serde(rename = "courseEngAbstract")]
    pub course_eng_abstract: Option<String>,
    pub day: Option<String>,
    #[serde(rename = "mainTeacherNames")]
    pub main_teacher_names: Vec<String>,
    #[serde(rename = "multipleTeacherNames")]
    pub multiple_teacher_names: Vec<String>,
    /// 教室短代碼（textContent）
    #[serde(rename = "roomNo")]
    pub room_no: Option<String>,
    /// 教室名稱（title，代碼為空時的後援）
    #[serde(rename = "roomTitle")]
    pub room_title: Option<String>,
    /// 節次文字，例如 `節05~節07`
    pub period: Option<String>,
    /// 節次 title，例如 `節08(15:40~16:30)\n節09(16:40~17:30)`
    #[serde(rename = "periodTime")]
    pub period_time: Option<String>,
}

/// 一筆課程（以 (semester, courseFullID) 為自然鍵）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub semester: i64,
    #[serde(rename = "courseFullID")]
    pub course_full_id: String,
    #[serde(rename = "courseName")]
    pub course_name: String,
    #[serde(rename = "courseEngName")]
    pub course_eng_name: Option<String>,
    pub department: String,
    #[serde(rename = "departmentID")]
    pub department_id: String,
    #[serde(rename = "courseType")]
    pub course_type: String,
    #[serde(rename = "subjectID")]
    pub subject_id: String,
    #[serde(rename = "subjectGroup")]
    pub subject_group: String,
    pub grade: String,
    #[serde(rename = "classGroup")]
    pub class_group: String,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "classID")]
    pub class_id: String,
    pub credit: i64,
    #[serde(rename = "totalOfTakingStudents")]
    pub total_of_taking_students: Option<i64>,
    #[serde(rename = "numberOfTakingStudents")]
    pub number_of_taking_students: i64,
    #[serde(rename = "weekNumber")]
    pub week_number: String,
    pub day: String,
    #[serde(rename = "dayNum")]
    pub day_num: i64,
    #[serde(rename = "startPeriod")]
    pub start_period: i64,
    #[serde(rename = "endPeriod")]
    pub end_period: i64,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "courseLocation")]
    pub course_location: Option<String>,
    #[serde(rename = "mainTeacherName")]
    pub main_teacher_name: String,
    #[serde(rename = "multipleTeacherName")]
    pub multiple_teacher_name: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "courseAbstract")]
    pub course_abstract: Option<String>,
    #[serde(rename = "courseEngAbstract")]
    pub course_eng_abstract: Option<String>,
}

/// 必填文字欄位：缺漏時補空字串
fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// 選填文字欄位：trim 後為空視同缺漏
fn opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 數值欄位：解析失敗補 0
fn int_or_zero(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

impl Course {
    /// 把原始擷取結果組裝成固定型別的課程紀錄
    pub(crate) fn from_raw(raw: RawCourseRow) -> Self {
        let day = text(raw.day);
        let day_num = weekday_num(&day);

        // 節次缺漏時起訖補 0，不丟棄整筆課程
        let (start_period, end_period) = match opt(raw.period) {
            Some(period) => {
                let range = sanitize_period(&period);
                (
                    int_or_zero(&range.start_period),
                    int_or_zero(&range.end_period),
                )
            }
            None => (0, 0),
        };

        let time = sanitize_time(&text(raw.period_time));

        // 教室以短代碼優先，代碼與名稱皆空才視為缺漏
        let course_location = opt(raw.room_no).or_else(|| opt(raw.room_title));

        let main_teacher_name = raw.main_teacher_names.join(", ");
        let multiple_teacher_name = Some(raw.multiple_teacher_names.join(", "))
            .filter(|names| !names.is_empty());

        Self {
            semester: int_or_zero(&text(raw.semester)),
            course_full_id: text(raw.course_full_id),
            course_name: text(raw.course_name),
            course_eng_name: opt(raw.course_eng_name),
            department: text(raw.department),
            department_id: text(raw.department_id),
            course_type: text(raw.course_type),
            subject_id: text(raw.subject_id),
            subject_group: text(raw.subject_group),
            grade: text(raw.grade),
            class_group: text(raw.class_group),
            class_name: text(raw.class_name),
            class_id: text(raw.class_id),
            credit: int_or_zero(&text(raw.credit)),
            total_of_taking_students: opt(raw.total_of_taking_students)
                .and_then(|v| v.parse().ok()),
            number_of_taking_students: int_or_zero(&text(raw.number_of_taking_students)),
            week_number: text(raw.week_number),
            day,
            day_num,
            start_period,
            end_period,
            start_time: time.start_time,
            end_time: time.end_time,
            course_location,
            main_teacher_name,
            multiple_teacher_name,
            note: opt(raw.note),
            course_abstract: opt(raw.course_abstract),
            course_eng_abstract: opt(raw.course_eng_abstract),
        }
    }
}
