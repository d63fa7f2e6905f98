//! Typed services, one per header-injection policy.
//!
//! Each service is a thin, immutable wrapper around a [`RestClient`] whose
//! pipeline carries the policy. Paths are relative to the configured base URL.

use std::sync::Arc;

use reqwest::header::COOKIE;
use reqwest::Method;
use tracing::debug;

use super::requests::*;
use super::ApiResult;
use crate::auth::{LoginMode, OAuthResponse};
use crate::config::Config;
use crate::http::cookies::CookieJar;
use crate::http::decorate::{header_value, CSRF_HEADER, REFERER};
use crate::http::RestClient;
use crate::models::*;

const TOKEN_PATH: &str = "oauth2/token/";
const SOCIAL_TOKEN_PATH: &str = "oauth2/social-token/";
const PROFILE_PATH: &str = "api/stepics/1";
const FEEDBACK_PATH: &str = "requests/embedded/create/";

type Query = Vec<(&'static str, String)>;

fn ids_query(ids: &[i64]) -> Query {
    ids.iter().map(|id| ("ids[]", id.to_string())).collect()
}

/// Token endpoints, authenticated with the OAuth client's Basic credentials.
#[derive(Clone)]
pub struct OAuthService {
    client: RestClient,
    config: Arc<Config>,
    mode: LoginMode,
}

impl OAuthService {
    pub fn new(client: RestClient, config: Arc<Config>, mode: LoginMode) -> Self {
        Self {
            client,
            config,
            mode,
        }
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> ApiResult<OAuthResponse> {
        let form = [
            ("grant_type", self.config.refresh_grant_type.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.client.post_form(TOKEN_PATH, &form).await
    }

    pub async fn login_password(&self, login: &str, password: &str) -> ApiResult<OAuthResponse> {
        let form = [
            ("grant_type", self.config.grant_type(self.mode)),
            ("username", login),
            ("password", password),
        ];
        self.client.post_form(TOKEN_PATH, &form).await
    }

    pub async fn token_by_code(&self, code: &str) -> ApiResult<OAuthResponse> {
        let form = [
            ("grant_type", self.config.grant_type(self.mode)),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.client.post_form(TOKEN_PATH, &form).await
    }

    /// Exchange a code (or access token) obtained from a native social SDK.
    pub async fn token_by_native_code(
        &self,
        provider: &str,
        code: &str,
        code_type: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<OAuthResponse> {
        let mut form = vec![
            ("provider", provider),
            ("code", code),
            ("grant_type", self.config.grant_type(self.mode)),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        if let Some(code_type) = code_type {
            form.push(("code_type", code_type));
        }
        if let Some(email) = email {
            form.push(("email", email));
        }
        self.client.post_form(SOCIAL_TOKEN_PATH, &form).await
    }
}

/// Unauthenticated endpoints.
#[derive(Clone)]
pub struct AnonymousService {
    client: RestClient,
}

impl AnonymousService {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn base_url(&self) -> &reqwest::Url {
        self.client.base_url()
    }

    /// Hit the landing page so the backend issues session and CSRF cookies.
    /// The status is not checked; whatever cookies come back are kept.
    pub async fn bootstrap_cookies(&self, language: &str, jar: &CookieJar) -> ApiResult<usize> {
        let builder = self
            .client
            .request(Method::GET, "")?
            .query(&[("lang", language)]);
        let response = self.client.send(builder).await?;
        // Filed under the base URL even when the landing page redirects.
        let harvested = jar.harvest(self.base_url(), response.headers());
        debug!(status = %response.status(), harvested, "cookie bootstrap finished");
        Ok(harvested)
    }

    /// Profile of the cookie session. `Ok(None)` when the backend has no
    /// profile row for it yet.
    pub async fn profile_with_cookie(&self, cookies: &str, csrf: &str) -> ApiResult<Option<Profile>> {
        let mut cookie = header_value(cookies)?;
        cookie.set_sensitive(true);
        let builder = self
            .client
            .request(Method::GET, PROFILE_PATH)?
            .header(COOKIE, cookie)
            .header(CSRF_HEADER, header_value(csrf)?)
            .header(REFERER, header_value(self.base_url().as_str().trim_end_matches('/'))?);
        let response: ProfileResponse = self.client.fetch(builder).await?;
        Ok(response.into_profile())
    }

    pub async fn update_info(&self, endpoint: &str) -> ApiResult<UpdateInfo> {
        self.client.get_resource(endpoint).await
    }
}

/// Endpoints that authenticate with the anonymous session's cookies.
#[derive(Clone)]
pub struct CookieAuthService {
    client: RestClient,
}

impl CookieAuthService {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub async fn create_account(&self, user: &RegistrationUser) -> ApiResult<()> {
        let builder = self
            .client
            .request(Method::POST, "api/users")?
            .json(&RegistrationRequest { user });
        self.client.execute_empty(builder).await
    }

    pub async fn remind_password(&self, email: &str) -> ApiResult<()> {
        let builder = self
            .client
            .request(Method::POST, "accounts/password/reset/")?
            .form(&[("email", email)]);
        self.client.execute_empty(builder).await
    }
}

/// Help desk form endpoint. Lives on its own host and sends no credentials.
#[derive(Clone)]
pub struct FeedbackService {
    client: RestClient,
}

impl FeedbackService {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub async fn send(&self, subject: &str, email: &str, tags: &str, description: &str) -> ApiResult<()> {
        let form = [
            ("subject", subject),
            ("email", email),
            ("set_tags", tags),
            ("description", description),
        ];
        let builder = self.client.request(Method::POST, FEEDBACK_PATH)?.form(&form);
        self.client.execute_empty(builder).await
    }
}

/// Endpoints for the signed-in (or cookie-bootstrapped) user. The pipeline
/// carries the token refresh coordinator.
#[derive(Clone)]
pub struct LoggedService {
    client: RestClient,
}

impl LoggedService {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    // ===== Courses =====

    pub async fn enrolled_courses(&self, page: i32) -> ApiResult<CoursesResponse> {
        let query = [("enrolled", "true".to_string()), ("page", page.to_string())];
        self.client.get("api/courses", &query).await
    }

    pub async fn featured_courses(&self, page: i32, language: &str) -> ApiResult<CoursesResponse> {
        let query = [
            ("is_featured", "true".to_string()),
            ("page", page.to_string()),
            ("language", language.to_string()),
        ];
        self.client.get("api/courses", &query).await
    }

    pub async fn courses(&self, page: Option<i32>, ids: &[i64]) -> ApiResult<CoursesResponse> {
        let mut query = ids_query(ids);
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        self.client.get("api/courses", &query).await
    }

    pub async fn search(&self, page: i32, query: &str, kind: &str) -> ApiResult<SearchResultsResponse> {
        let query = [
            ("page", page.to_string()),
            ("query", query.to_string()),
            ("type", kind.to_string()),
        ];
        self.client.get("api/search-results", &query).await
    }

    pub async fn join_course(&self, course_id: i64) -> ApiResult<()> {
        let body = EnrollmentRequest {
            enrollment: Enrollment { course: course_id },
        };
        let builder = self.client.request(Method::POST, "api/enrollments")?.json(&body);
        self.client.execute_empty(builder).await
    }

    pub async fn drop_course(&self, course_id: i64) -> ApiResult<()> {
        let path = format!("api/enrollments/{}", course_id);
        let builder = self.client.request(Method::DELETE, &path)?;
        self.client.execute_empty(builder).await
    }

    pub async fn course_lists(&self, language: &str) -> ApiResult<CourseCollectionsResponse> {
        let query = [("platform", "mobile"), ("language", language)];
        self.client.get("api/course-lists", &query).await
    }

    pub async fn course_reviews(&self, course_ids: &[i64]) -> ApiResult<CourseReviewsResponse> {
        let query: Query = course_ids
            .iter()
            .map(|id| ("course[]", id.to_string()))
            .collect();
        self.client.get("api/course-reviews", &query).await
    }

    // ===== Structure =====

    pub async fn sections(&self, ids: &[i64]) -> ApiResult<SectionsResponse> {
        self.client.get("api/sections", &ids_query(ids)).await
    }

    pub async fn units(&self, ids: &[i64]) -> ApiResult<UnitsResponse> {
        self.client.get("api/units", &ids_query(ids)).await
    }

    pub async fn unit_by_lesson(&self, lesson_id: i64) -> ApiResult<UnitsResponse> {
        self.client.get("api/units", &[("lesson", lesson_id)]).await
    }

    pub async fn lessons(&self, ids: &[i64]) -> ApiResult<LessonsResponse> {
        self.client.get("api/lessons", &ids_query(ids)).await
    }

    pub async fn steps(&self, ids: &[i64]) -> ApiResult<StepsResponse> {
        self.client.get("api/steps", &ids_query(ids)).await
    }

    pub async fn progresses(&self, ids: &[String]) -> ApiResult<ProgressesResponse> {
        let query: Query = ids.iter().map(|id| ("ids[]", id.clone())).collect();
        self.client.get("api/progresses", &query).await
    }

    pub async fn assignments(&self, ids: &[i64]) -> ApiResult<AssignmentsResponse> {
        self.client.get("api/assignments", &ids_query(ids)).await
    }

    pub async fn post_view(&self, assignment: Option<i64>, step: i64) -> ApiResult<()> {
        let body = ViewRequest {
            view: View { assignment, step },
        };
        let builder = self.client.request(Method::POST, "api/views")?.json(&body);
        self.client.execute_empty(builder).await
    }

    pub async fn last_step(&self, id: &str) -> ApiResult<LastStepsResponse> {
        let path = format!("api/last-steps/{}", id);
        self.client.get_resource(&path).await
    }

    // ===== Quizzes =====

    pub async fn create_attempt(&self, step_id: i64) -> ApiResult<AttemptsResponse> {
        let body = AttemptRequest {
            attempt: NewAttempt { step: step_id },
        };
        self.client.post_json("api/attempts", &body).await
    }

    pub async fn attempts(&self, step_id: i64, user_id: i64) -> ApiResult<AttemptsResponse> {
        self.client
            .get("api/attempts", &[("step", step_id), ("user", user_id)])
            .await
    }

    pub async fn create_submission(&self, reply: Reply, attempt_id: i64) -> ApiResult<SubmissionsResponse> {
        let body = SubmissionRequest {
            submission: NewSubmission {
                reply,
                attempt: attempt_id,
            },
        };
        self.client.post_json("api/submissions", &body).await
    }

    pub async fn submissions(&self, attempt_id: i64, order: &str) -> ApiResult<SubmissionsResponse> {
        let query = [("attempt", attempt_id.to_string()), ("order", order.to_string())];
        self.client.get("api/submissions", &query).await
    }

    pub async fn submissions_for_step(&self, step_id: i64) -> ApiResult<SubmissionsResponse> {
        self.client.get("api/submissions", &[("step", step_id)]).await
    }

    // ===== Users =====

    pub async fn profile(&self) -> ApiResult<ProfileResponse> {
        self.client.get_resource(PROFILE_PATH).await
    }

    pub async fn users(&self, ids: &[i64]) -> ApiResult<UsersResponse> {
        self.client.get("api/users", &ids_query(ids)).await
    }

    pub async fn email_addresses(&self, ids: &[i64]) -> ApiResult<EmailAddressesResponse> {
        self.client.get("api/email-addresses", &ids_query(ids)).await
    }

    pub async fn user_activities(&self, user_id: i64) -> ApiResult<UserActivitiesResponse> {
        let path = format!("api/user-activities/{}", user_id);
        self.client.get_resource(&path).await
    }

    pub async fn certificates(&self, user_id: i64) -> ApiResult<CertificatesResponse> {
        self.client.get("api/certificates", &[("user", user_id)]).await
    }

    // ===== Devices =====

    pub async fn devices(&self, user_id: i64) -> ApiResult<DevicesResponse> {
        self.client.get("api/devices", &[("user", user_id)]).await
    }

    pub async fn register_device(&self, device: NewDevice) -> ApiResult<DevicesResponse> {
        self.client
            .post_json("api/devices", &DeviceRequest { device })
            .await
    }

    pub async fn remove_device(&self, device_id: i64) -> ApiResult<()> {
        let path = format!("api/devices/{}", device_id);
        let builder = self.client.request(Method::DELETE, &path)?;
        self.client.execute_empty(builder).await
    }

    // ===== Notifications =====

    pub async fn notifications(&self, page: i32, kind: Option<&str>) -> ApiResult<NotificationsResponse> {
        let mut query: Query = vec![("page", page.to_string())];
        if let Some(kind) = kind {
            query.push(("type", kind.to_string()));
        }
        self.client.get("api/notifications", &query).await
    }

    pub async fn mark_notifications_read(&self, kind: Option<&str>) -> ApiResult<()> {
        let mut builder = self
            .client
            .request(Method::POST, "api/notifications/mark-as-read")?;
        if let Some(kind) = kind {
            builder = builder.query(&[("type", kind)]);
        }
        self.client.execute_empty(builder).await
    }

    pub async fn update_notification(&self, id: i64, is_unread: bool) -> ApiResult<()> {
        let path = format!("api/notifications/{}", id);
        let body = NotificationRequest {
            notification: NotificationUpdate { is_unread },
        };
        let builder = self.client.request(Method::PUT, &path)?.json(&body);
        self.client.execute_empty(builder).await
    }

    // ===== Discussions =====

    pub async fn discussion_proxy(&self, id: &str) -> ApiResult<DiscussionProxiesResponse> {
        let path = format!("api/discussion-proxies/{}", id);
        self.client.get_resource(&path).await
    }

    pub async fn comments(&self, ids: &[i64]) -> ApiResult<CommentsResponse> {
        self.client.get("api/comments", &ids_query(ids)).await
    }

    pub async fn post_comment(&self, comment: NewComment) -> ApiResult<CommentsResponse> {
        self.client
            .post_json("api/comments", &CommentRequest { comment })
            .await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> ApiResult<CommentsResponse> {
        let path = format!("api/comments/{}", comment_id);
        self.client
            .fetch(self.client.request(Method::DELETE, &path)?)
            .await
    }

    pub async fn vote(&self, vote: VoteUpdate) -> ApiResult<VotesResponse> {
        let path = format!("api/votes/{}", vote.id);
        self.client.put_json(&path, &VoteRequest { vote }).await
    }
}
