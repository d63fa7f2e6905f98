//! JSON envelopes returned by the REST API.
//!
//! Every list endpoint answers `{"meta": {...}, "<resources>": [...]}`.
//! The resource array is required: a body without it (an error payload sent
//! with a 2xx status, say) fails to decode instead of reading as empty.

use serde::{Deserialize, Serialize};

use super::{
    Assignment, Attempt, Certificate, Comment, Course, CourseCollection, CourseReview, Device,
    DiscussionProxy, EmailAddress, LastStep, Lesson, Notification, Profile, Progress,
    SearchResult, Section, Step, Submission, Unit, User, UserActivity, Vote,
};

/// Pagination info.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub page: i32,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursesResponse {
    #[serde(default)]
    pub meta: Meta,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressesResponse {
    #[serde(default)]
    pub meta: Meta,
    pub progresses: Vec<Progress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastStepsResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "last-steps", alias = "last_steps")]
    pub last_steps: Vec<LastStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseCollectionsResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "course-lists", alias = "course_lists")]
    pub course_lists: Vec<CourseCollection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseReviewsResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "course-reviews", alias = "course_reviews")]
    pub course_reviews: Vec<CourseReview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResultsResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "search-results", alias = "search_results")]
    pub search_results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttemptsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub submissions: Vec<Submission>,
}

/// `GET /api/stepics/1`: the current user's profile plus related users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl ProfileResponse {
    pub fn into_profile(self) -> Option<Profile> {
        self.profiles.into_iter().next()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub meta: Meta,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailAddressesResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "email-addresses", alias = "email_addresses")]
    pub email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserActivitiesResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "user-activities", alias = "user_activities")]
    pub user_activities: Vec<UserActivity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub meta: Meta,
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificatesResponse {
    #[serde(default)]
    pub meta: Meta,
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub votes: Vec<Vote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VotesResponse {
    #[serde(default)]
    pub meta: Meta,
    pub votes: Vec<Vote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscussionProxiesResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(rename = "discussion-proxies", alias = "discussion_proxies")]
    pub discussion_proxies: Vec<DiscussionProxy>,
}
