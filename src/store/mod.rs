//! 課程資料庫模組
//!
//! SQLite 持久化：以 (semester, courseFullID) 為自然鍵 upsert 課程，
//! 搜尋引擎組合多值過濾條件並以遞增的 id 做 seek pagination。

mod types;

pub use types::{CourseRow, Pagination, SearchPage, SearchParams};

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, ToSql};
use tracing::{debug, info};

use crate::course::Course;
use crate::error::CrawlError;

const SCHEMA_SQL: &str = include_str!("../../sql/init_courses.sql");

/// 搜尋預設每頁筆數
const DEFAULT_LIMIT: i64 = 20;

/// 以自然鍵 upsert：衝突時覆寫所有描述性欄位，id 與 created_at 不動
const UPSERT_SQL: &str = "
    INSERT INTO courses (
        semester, courseFullID, courseName, courseEngName, department,
        departmentID, courseType, subjectID, subjectGroup, grade,
        classGroup, className, classID, credit, totalOfTakingStudents,
        numberOfTakingStudents, weekNumber, day, dayNum, startPeriod,
        endPeriod, startTime, endTime, courseLocation, mainTeacherName,
        multipleTeacherName, note, courseAbstract, courseEngAbstract
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
        ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
        ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29
    )
    ON CONFLICT(semester, courseFullID) DO UPDATE SET
        courseName = excluded.courseName,
        courseEngName = excluded.courseEngName,
        department = excluded.department,
        departmentID = excluded.departmentID,
        courseType = excluded.courseType,
        subjectID = excluded.subjectID,
        subjectGroup = excluded.subjectGroup,
        grade = excluded.grade,
        classGroup = excluded.classGroup,
        className = excluded.className,
        classID = excluded.classID,
        credit = excluded.credit,
        totalOfTakingStudents = excluded.totalOfTakingStudents,
        numberOfTakingStudents = excluded.numberOfTakingStudents,
        weekNumber = excluded.weekNumber,
        day = excluded.day,
        dayNum = excluded.dayNum,
        startPeriod = excluded.startPeriod,
        endPeriod = excluded.endPeriod,
        startTime = excluded.startTime,
        endTime = excluded.endTime,
        courseLocation = excluded.courseLocation,
        mainTeacherName = excluded.mainTeacherName,
        multipleTeacherName = excluded.multipleTeacherName,
        note = excluded.note,
        courseAbstract = excluded.courseAbstract,
        courseEngAbstract = excluded.courseEngAbstract
";

const SELECT_COLUMNS: &str = "
    id, semester, courseFullID, courseName, courseEngName, department,
    departmentID, courseType, subjectID, subjectGroup, grade, classGroup,
    className, classID, credit, totalOfTakingStudents, numberOfTakingStudents,
    weekNumber, day, dayNum, startPeriod, endPeriod, startTime, endTime,
    courseLocation, mainTeacherName, multipleTeacherName, note,
    courseAbstract, courseEngAbstract, created_at
";

/// 課程資料庫
pub struct CourseStore {
    db: Mutex<Connection>,
}

impl CourseStore {
    /// 開啟（或建立）課程資料庫
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// 記憶體資料庫（測試用）
    pub fn open_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, CrawlError> {
        // LIKE 對 ASCII 預設不分大小寫，課名子字串比對需要精確
        conn.pragma_update(None, "case_sensitive_like", true)?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// 批次寫入一次爬蟲結果
    ///
    /// 全部寫入包在同一個交易：不是整批成功就是整批失敗，
    /// 不會有部分套用。空清單是合法的 no-op。
    pub fn upsert_courses(&self, courses: &[Course]) -> Result<usize, CrawlError> {
        if courses.is_empty() {
            debug!("沒有課程資料，略過寫入");
            return Ok(0);
        }

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for course in courses {
                stmt.execute(params![
                    course.semester,
                    course.course_full_id,
                    course.course_name,
                    course.course_eng_name,
                    course.department,
                    course.department_id,
                    course.course_type,
                    course.subject_id,
                    course.subject_group,
                    course.grade,
                    course.class_group,
                    course.class_name,
                    course.class_id,
                    course.credit,
                    course.total_of_taking_students,
                    course.number_of_taking_students,
                    course.week_number,
                    course.day,
                    course.day_num,
                    course.start_period,
                    course.end_period,
                    course.start_time,
                    course.end_time,
                    course.course_location,
                    course.main_teacher_name,
                    course.multiple_teacher_name,
                    course.note,
                    course.course_abstract,
                    course.course_eng_abstract,
                ])?;
            }
        }
        tx.commit()?;

        info!("已寫入 {} 筆課程", courses.len());
        Ok(courses.len())
    }

    /// 搜尋課程
    ///
    /// 取 limit + 1 筆來判斷是否還有下一頁，多出來的那筆不回傳；
    /// `next_cursor` 是本頁最後一筆的 id，沒有下一頁時為 None。
    pub fn search(&self, params: &SearchParams) -> Result<SearchPage, CrawlError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        push_in("semester", &params.semester, &mut clauses, &mut values);
        push_in(
            "departmentID",
            &params.department_id,
            &mut clauses,
            &mut values,
        );
        push_in("grade", &params.grade, &mut clauses, &mut values);
        push_in("dayNum", &params.day_num, &mut clauses, &mut values);
        push_in(
            "startPeriod",
            &params.start_period,
            &mut clauses,
            &mut values,
        );
        push_in("endPeriod", &params.end_period, &mut clauses, &mut values);

        if let Some(name) = &params.course_name {
            clauses.push("courseName LIKE ?".to_string());
            values.push(Box::new(format!("%{}%", name)));
        }

        if let Some(cursor) = params.cursor {
            clauses.push("id > ?".to_string());
            values.push(Box::new(cursor));
        }

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).max(0);

        let mut sql = format!("SELECT {} FROM courses", SELECT_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC LIMIT ?");
        values.push(Box::new(limit + 1));

        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&sql)?;
        let mut rows: Vec<CourseRow> = stmt
            .query_map(
                rusqlite::params_from_iter(values.iter().map(|value| value.as_ref())),
                map_course_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let has_next_page = rows.len() as i64 > limit;
        if has_next_page {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_next_page {
            rows.last().map(|row| row.id)
        } else {
            None
        };

        Ok(SearchPage {
            data: rows,
            pagination: Pagination {
                has_next_page,
                next_cursor,
            },
        })
    }
}

/// 多值過濾：空清單不加條件，否則產生 `col IN (?, ...)`
fn push_in<T: ToSql + Clone + 'static>(
    column: &str,
    filter: &[T],
    clauses: &mut Vec<String>,
    values: &mut Vec<Box<dyn ToSql>>,
) {
    if filter.is_empty() {
        return;
    }

    let placeholders = vec!["?"; filter.len()].join(", ");
    clauses.push(format!("{} IN ({})", column, placeholders));
    for value in filter {
        values.push(Box::new(value.clone()));
    }
}

fn map_course_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CourseRow> {
    Ok(CourseRow {
        id: row.get(0)?,
        semester: row.get(1)?,
        course_full_id: row.get(2)?,
        course_name: row.get(3)?,
        course_eng_name: row.get(4)?,
        department: row.get(5)?,
        department_id: row.get(6)?,
        course_type: row.get(7)?,
        subject_id: row.get(8)?,
        subject_group: row.get(9)?,
        grade: row.get(10)?,
        class_group: row.get(11)?,
        class_name: row.get(12)?,
        class_id: row.get(13)?,
        credit: row.get(14)?,
        total_of_taking_students: row.get(15)?,
        number_of_taking_students: row.get(16)?,
        week_number: row.get(17)?,
        day: row.get(18)?,
        day_num: row.get(19)?,
        start_period: row.get(20)?,
        end_period: row.get(21)?,
        start_time: row.get(22)?,
        end_time: row.get(23)?,
        course_location: row.get(24)?,
        main_teacher_name: row.get(25)?,
        multiple_teacher_name: row.get(26)?,
        note: row.get(27)?,
        course_abstract: row.get(28)?,
        course_eng_abstract: row.get(29)?,
        created_at: row.get(30)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 測試用課程，必要欄位帶合理預設
    fn course(semester: i64, full_id: &str, name: &str) -> Course {
        Course {
            semester,
            course_full_id: full_id.to_string(),
            course_name: name.to_string(),
            course_eng_name: None,
            department: "護理系".to_string(),
            department_id: "11100".to_string(),
            course_type: "專業必修(系所)".to_string(),
            subject_id: "0001".to_string(),
            subject_group: "01".to_string(),
            grade: "1".to_string(),
            class_group: "10".to_string(),
            class_name: "護理1年10班".to_string(),
            class_id: "11100110".to_string(),
            credit: 2,
            total_of_taking_students: None,
            number_of_taking_students: 0,
            week_number: "全18週".to_string(),
            day: "週一".to_string(),
            day_num: 1,
            start_period: 1,
            end_period: 2,
            start_time: "08:10".to_string(),
            end_time: "10:00".to_string(),
            course_location: Some("F101".to_string()),
            main_teacher_name: "王小明".to_string(),
            multiple_teacher_name: None,
            note: None,
            course_abstract: None,
            course_eng_abstract: None,
        }
    }

    fn ids(page: &SearchPage) -> Vec<i64> {
        page.data.iter().map(|row| row.id).collect()
    }

    #[test]
    fn test_upsert_empty_is_noop() {
        let store = CourseStore::open_in_memory().unwrap();
        assert_eq!(store.upsert_courses(&[]).unwrap(), 0);

        let page = store.search(&SearchParams::new()).unwrap();
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_upsert_then_search_roundtrip() {
        let store = CourseStore::open_in_memory().unwrap();
        let courses = vec![
            course(1142, "43160012401110", "健康大數據分析"),
            course(1142, "43160012401111", "程式設計"),
        ];
        assert_eq!(store.upsert_courses(&courses).unwrap(), 2);

        let page = store.search(&SearchParams::new()).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].course_name, "健康大數據分析");
        assert_eq!(page.data[0].semester, 1142);
        assert!(!page.data[0].created_at.is_empty());
        assert!(!page.pagination.has_next_page);
        assert_eq!(page.pagination.next_cursor, None);
    }

    #[test]
    fn test_upsert_idempotent_keeps_id_and_created_at() {
        let store = CourseStore::open_in_memory().unwrap();
        store
            .upsert_courses(&[course(1142, "43160012401110", "健康大數據分析")])
            .unwrap();

        let before = store.search(&SearchParams::new()).unwrap();
        let original_id = before.data[0].id;

        // 把 created_at 改成可辨識的值，確認 upsert 不會碰它
        {
            let db = store.db.lock().unwrap();
            db.execute(
                "UPDATE courses SET created_at = '2020-01-01 00:00:00'",
                [],
            )
            .unwrap();
        }

        // 同一門課重爬，課名更新
        let mut updated = course(1142, "43160012401110", "健康大數據分析(一)");
        updated.number_of_taking_students = 30;
        store.upsert_courses(&[updated]).unwrap();

        let after = store.search(&SearchParams::new()).unwrap();
        assert_eq!(after.data.len(), 1);
        assert_eq!(after.data[0].id, original_id);
        assert_eq!(after.data[0].created_at, "2020-01-01 00:00:00");
        assert_eq!(after.data[0].course_name, "健康大數據分析(一)");
        assert_eq!(after.data[0].number_of_taking_students, 30);
    }

    #[test]
    fn test_same_course_id_in_different_semester_is_distinct() {
        let store = CourseStore::open_in_memory().unwrap();
        store
            .upsert_courses(&[
                course(1141, "43160012401110", "健康大數據分析"),
                course(1142, "43160012401110", "健康大數據分析"),
            ])
            .unwrap();

        let page = store.search(&SearchParams::new()).unwrap();
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn test_seek_pagination_visits_every_row_once() {
        let store = CourseStore::open_in_memory().unwrap();
        let courses: Vec<Course> = (0..7)
            .map(|i| course(1142, &format!("course-{:02}", i), &format!("課程{}", i)))
            .collect();
        store.upsert_courses(&courses).unwrap();

        let mut collected: Vec<i64> = Vec::new();
        let mut cursor: Option<i64> = None;
        let mut pages = 0;

        loop {
            let mut params = SearchParams::new().with_limit(3);
            if let Some(c) = cursor {
                params = params.with_cursor(c);
            }
            let page = store.search(&params).unwrap();
            collected.extend(ids(&page));
            pages += 1;

            if !page.pagination.has_next_page {
                assert_eq!(page.pagination.next_cursor, None);
                break;
            }
            assert_eq!(page.data.len(), 3);
            cursor = page.pagination.next_cursor;
            assert_eq!(cursor, page.data.last().map(|row| row.id));
        }

        assert_eq!(pages, 3);
        assert_eq!(collected.len(), 7);
        // 每筆恰好出現一次且遞增
        let mut sorted = collected.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, collected);
    }

    #[test]
    fn test_default_limit_is_twenty() {
        let store = CourseStore::open_in_memory().unwrap();
        let courses: Vec<Course> = (0..25)
            .map(|i| course(1142, &format!("course-{:02}", i), "課程"))
            .collect();
        store.upsert_courses(&courses).unwrap();

        let page = store.search(&SearchParams::new()).unwrap();
        assert_eq!(page.data.len(), 20);
        assert!(page.pagination.has_next_page);
        assert_eq!(
            page.pagination.next_cursor,
            page.data.last().map(|row| row.id)
        );
    }

    #[test]
    fn test_multi_value_filter_is_union_within_dimension() {
        let store = CourseStore::open_in_memory().unwrap();
        store
            .upsert_courses(&[
                course(1122, "a", "甲"),
                course(1141, "b", "乙"),
                course(1142, "c", "丙"),
            ])
            .unwrap();

        let only_1122 = store
            .search(&SearchParams::new().with_semesters(vec![1122]))
            .unwrap();
        let only_1142 = store
            .search(&SearchParams::new().with_semesters(vec![1142]))
            .unwrap();
        let both = store
            .search(&SearchParams::new().with_semesters(vec![1122, 1142]))
            .unwrap();

        let mut union = ids(&only_1122);
        union.extend(ids(&only_1142));
        union.sort_unstable();
        assert_eq!(union, ids(&both));
    }

    #[test]
    fn test_filters_intersect_across_dimensions() {
        let store = CourseStore::open_in_memory().unwrap();
        let mut tuesday = course(1142, "a", "甲");
        tuesday.day_num = 2;
        let mut tuesday_old = course(1122, "b", "乙");
        tuesday_old.day_num = 2;
        let mut friday = course(1142, "c", "丙");
        friday.day_num = 5;
        store
            .upsert_courses(&[tuesday, tuesday_old, friday])
            .unwrap();

        let by_semester = store
            .search(&SearchParams::new().with_semesters(vec![1142]))
            .unwrap();
        let by_day = store
            .search(&SearchParams::new().with_day_nums(vec![2]))
            .unwrap();
        let combined = store
            .search(
                &SearchParams::new()
                    .with_semesters(vec![1142])
                    .with_day_nums(vec![2]),
            )
            .unwrap();

        let semester_ids = ids(&by_semester);
        let day_ids = ids(&by_day);
        let expected: Vec<i64> = semester_ids
            .into_iter()
            .filter(|id| day_ids.contains(id))
            .collect();
        assert_eq!(ids(&combined), expected);
        assert_eq!(combined.data.len(), 1);
        assert_eq!(combined.data[0].course_name, "甲");
    }

    #[test]
    fn test_period_filter_is_exact_match_not_range() {
        let store = CourseStore::open_in_memory().unwrap();
        let mut third = course(1142, "a", "第三節開始");
        third.start_period = 3;
        let mut sixth = course(1142, "b", "第六節開始");
        sixth.start_period = 6;
        store.upsert_courses(&[third, sixth]).unwrap();

        // 查 3 不會帶出 6（精確比對，沒有 >= 語意）
        let page = store
            .search(&SearchParams::new().with_start_periods(vec![3]))
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].course_name, "第三節開始");

        // 要同時拿到就得列舉值
        let page = store
            .search(&SearchParams::new().with_start_periods(vec![3, 6]))
            .unwrap();
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn test_course_name_substring_filter() {
        let store = CourseStore::open_in_memory().unwrap();
        store
            .upsert_courses(&[
                course(1142, "a", "健康大數據分析"),
                course(1142, "b", "程式設計"),
                course(1142, "c", "Big Data Analysis"),
            ])
            .unwrap();

        let page = store
            .search(&SearchParams::new().with_course_name("大數據"))
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].course_name, "健康大數據分析");

        // 區分大小寫
        let page = store
            .search(&SearchParams::new().with_course_name("big"))
            .unwrap();
        assert!(page.data.is_empty());

        let page = store
            .search(&SearchParams::new().with_course_name("Big"))
            .unwrap();
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn test_combined_scenario_semester_day_period() {
        let store = CourseStore::open_in_memory().unwrap();

        let mut target_a = course(1142, "43160014301120", "健康大數據分析");
        target_a.day_num = 2;
        target_a.start_period = 3;
        target_a.end_period = 4;

        let mut target_b = course(1142, "43160014301121", "健康大數據分析");
        target_b.day_num = 2;
        target_b.start_period = 3;
        target_b.end_period = 4;

        // 同學期但不同星期／節次的干擾資料
        let mut other_day = course(1142, "x1", "健康大數據分析");
        other_day.day_num = 3;
        other_day.start_period = 3;
        other_day.end_period = 4;
        let mut other_period = course(1142, "x2", "程式設計");
        other_period.day_num = 2;
        other_period.start_period = 6;
        other_period.end_period = 7;
        let mut old_semester = course(1122, "x3", "休閒與生活");
        old_semester.day_num = 2;
        old_semester.start_period = 3;
        old_semester.end_period = 4;

        store
            .upsert_courses(&[target_a, target_b, other_day, other_period, old_semester])
            .unwrap();

        let page = store
            .search(
                &SearchParams::new()
                    .with_semesters(vec![1142])
                    .with_day_nums(vec![2])
                    .with_start_periods(vec![3])
                    .with_end_periods(vec![4]),
            )
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert!(page
            .data
            .iter()
            .all(|row| row.course_name == "健康大數據分析"
                && row.semester == 1142
                && row.day_num == 2
                && row.start_period == 3
                && row.end_period == 4));
        // 依 id 遞增
        assert!(page.data[0].id < page.data[1].id);
    }

    #[test]
    fn test_empty_result_shape() {
        let store = CourseStore::open_in_memory().unwrap();
        store.upsert_courses(&[course(1142, "a", "甲")]).unwrap();

        let page = store
            .search(&SearchParams::new().with_semesters(vec![9999]))
            .unwrap();
        assert!(page.data.is_empty());
        assert!(!page.pagination.has_next_page);
        assert_eq!(page.pagination.next_cursor, None);
    }
}
