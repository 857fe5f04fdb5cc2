use serde::{Deserialize, Serialize};

/// 用户选择加入抢课列表的教学班，尚未分配 id
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub teaching_class_id: String,
    pub course_name: String,
    pub teacher_name: String,
    pub elective_batch_code: String,
    pub teaching_class_type: String,
    pub campus: String,
    pub is_major: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teaching_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_count: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedCourse {
    pub id: String,
    #[serde(flatten)]
    pub course: NewCourse,
    pub added_at: i64,
}

impl NewCourse {
    /// (teachingClassId, electiveBatchCode)，队列中唯一
    pub fn natural_key(&self) -> (&str, &str) {
        (&self.teaching_class_id, &self.elective_batch_code)
    }
}

impl QueuedCourse {
    pub fn natural_key(&self) -> (&str, &str) {
        self.course.natural_key()
    }
}
