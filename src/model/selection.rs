use serde::Serialize;

use crate::model::login_session::LoginSession;
use crate::model::queued_course::QueuedCourse;

/// `/select-class` 与 `/drop-class` 的请求体
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub username: String,
    pub password: String,
    pub elective_batch_code: String,
    pub teaching_class_id: String,
    pub is_major: String,
    pub campus: String,
    pub teaching_class_type: String,
    pub operation_type: String,
}

impl SelectionRequest {
    pub fn new(session: &LoginSession, elective_batch_code: &str, teaching_class_id: &str) -> Self {
        SelectionRequest {
            username: session.username.clone(),
            password: session.password.clone(),
            elective_batch_code: elective_batch_code.to_string(),
            teaching_class_id: teaching_class_id.to_string(),
            is_major: "1".to_string(),
            campus: "02".to_string(),
            teaching_class_type: "XGXK".to_string(),
            operation_type: "1".to_string(),
        }
    }

    pub fn for_course(session: &LoginSession, queued: &QueuedCourse) -> Self {
        let course = &queued.course;
        SelectionRequest {
            is_major: course.is_major.clone(),
            campus: course.campus.clone(),
            teaching_class_type: course.teaching_class_type.clone(),
            ..SelectionRequest::new(session, &course.elective_batch_code, &course.teaching_class_id)
        }
    }
}

/// `/get-courses` 的请求体
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    pub username: String,
    pub password: String,
    pub elective_batch_code: String,
    pub is_major: String,
    pub campus: String,
    pub teaching_class_type: String,
    pub query_content: String,
    pub check_conflict: String,
    pub check_capacity: String,
}

impl CourseQuery {
    pub fn new(session: &LoginSession, elective_batch_code: &str) -> Self {
        CourseQuery {
            username: session.username.clone(),
            password: session.password.clone(),
            elective_batch_code: elective_batch_code.to_string(),
            is_major: "1".to_string(),
            campus: "02".to_string(),
            teaching_class_type: "XGXK".to_string(),
            query_content: String::new(),
            check_conflict: "2".to_string(),
            check_capacity: "2".to_string(),
        }
    }
}

/// `/start-grab-course` 的请求体，服务端按 `selectRate` 秒轮询选课
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GrabRequest {
    #[serde(flatten)]
    pub selection: SelectionRequest,
    pub select_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_msg: Option<String>,
}

impl GrabRequest {
    pub fn new(selection: SelectionRequest) -> Self {
        GrabRequest {
            selection,
            select_rate: 2,
            email_user: None,
            email_auth: None,
            email_msg: None,
        }
    }
}
