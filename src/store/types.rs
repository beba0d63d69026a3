//! 課程資料庫的查詢與回應型別

use serde::{Deserialize, Serialize};

/// 資料庫中的一筆課程（含代理鍵與建立時間）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRow {
    /// 遞增代理鍵，搜尋結果的排序與 seek pagination 皆以此為準
    pub id: i64,
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
    /// 寫入時間，首次 insert 時指定，之後不再更動
    pub created_at: String,
}

/// 課程搜尋條件
///
/// 同一維度內的多個值是 OR，不同維度之間是 AND；空清單代表該維度不限制。
/// `start_period` / `end_period` 是對值集合的精確比對，不是範圍查詢。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub semester: Vec<i64>,
    #[serde(rename = "departmentID")]
    pub department_id: Vec<String>,
    pub grade: Vec<String>,
    #[serde(rename = "dayNum")]
    pub day_num: Vec<i64>,
    #[serde(rename = "startPeriod")]
    pub start_period: Vec<i64>,
    #[serde(rename = "endPeriod")]
    pub end_period: Vec<i64>,
    /// 課程名稱子字串（區分大小寫）
    #[serde(rename = "courseName")]
    pub course_name: Option<String>,
    /// 每頁筆數，預設 20
    pub limit: Option<i64>,
    /// seek pagination 游標（上一頁最後一筆的 id）
    pub cursor: Option<i64>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_semesters(mut self, semesters: Vec<i64>) -> Self {
        self.semester = semesters;
        self
    }

    pub fn with_department_ids(mut self, department_ids: Vec<String>) -> Self {
        self.department_id = department_ids;
        self
    }

    pub fn with_grades(mut self, grades: Vec<String>) -> Self {
        self.grade = grades;
        self
    }

    pub fn with_day_nums(mut self, day_nums: Vec<i64>) -> Self {
        self.day_num = day_nums;
        self
    }

    pub fn with_start_periods(mut self, periods: Vec<i64>) -> Self {
        self.start_period = periods;
        self
    }

    pub fn with_end_periods(mut self, periods: Vec<i64>) -> Self {
        self.end_period = periods;
        self
    }

    pub fn with_course_name(mut self, name: impl Into<String>) -> Self {
        self.course_name = Some(name.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// 分頁資訊
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    /// 下一頁的游標（本頁最後一筆的 id）；沒有下一頁時為 null
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<i64>,
}

/// 一頁搜尋結果
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub data: Vec<CourseRow>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new()
            .with_semesters(vec![1141, 1142])
            .with_day_nums(vec![2])
            .with_course_name("大數據")
            .with_limit(5)
            .with_cursor(42);

        assert_eq!(params.semester, vec![1141, 1142]);
        assert_eq!(params.day_num, vec![2]);
        assert_eq!(params.course_name.as_deref(), Some("大數據"));
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.cursor, Some(42));
        assert!(params.department_id.is_empty());
    }

    #[test]
    fn test_search_params_deserializes_wire_names() {
        let params: SearchParams = serde_json::from_str(
            r#"{"semester": [1142], "dayNum": [2, 4], "startPeriod": [3], "courseName": "健康"}"#,
        )
        .unwrap();

        assert_eq!(params.semester, vec![1142]);
        assert_eq!(params.day_num, vec![2, 4]);
        assert_eq!(params.start_period, vec![3]);
        assert_eq!(params.course_name.as_deref(), Some("健康"));
        assert!(params.end_period.is_empty());
        assert_eq!(params.limit, None);
    }
}
