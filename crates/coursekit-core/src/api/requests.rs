//! Request bodies. The backend wraps every payload in a singular envelope,
//! e.g. `{"attempt": {"step": 1}}`.

use serde::Serialize;

use crate::models::{Reply, VoteValue};

#[derive(Debug, Serialize)]
pub struct EnrollmentRequest {
    pub enrollment: Enrollment,
}

#[derive(Debug, Serialize)]
pub struct Enrollment {
    pub course: i64,
}

#[derive(Debug, Serialize)]
pub struct ViewRequest {
    pub view: View,
}

#[derive(Debug, Serialize)]
pub struct View {
    pub assignment: Option<i64>,
    pub step: i64,
}

#[derive(Debug, Serialize)]
pub struct AttemptRequest {
    pub attempt: NewAttempt,
}

#[derive(Debug, Serialize)]
pub struct NewAttempt {
    pub step: i64,
}

#[derive(Debug, Serialize)]
pub struct SubmissionRequest {
    pub submission: NewSubmission,
}

#[derive(Debug, Serialize)]
pub struct NewSubmission {
    pub reply: Reply,
    pub attempt: i64,
}

#[derive(Debug, Serialize)]
pub struct DeviceRequest {
    pub device: NewDevice,
}

#[derive(Debug, Serialize)]
pub struct NewDevice {
    pub registration_id: String,
    pub description: String,
    pub client_type: String,
    pub is_badges_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationRequest {
    pub notification: NotificationUpdate,
}

#[derive(Debug, Serialize)]
pub struct NotificationUpdate {
    pub is_unread: bool,
}

#[derive(Debug, Serialize)]
pub struct CommentRequest {
    pub comment: NewComment,
}

#[derive(Debug, Serialize)]
pub struct NewComment {
    pub target: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VoteRequest {
    pub vote: VoteUpdate,
}

#[derive(Debug, Serialize)]
pub struct VoteUpdate {
    pub id: String,
    pub value: Option<VoteValue>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationRequest<'a> {
    pub user: &'a crate::models::RegistrationUser,
}
