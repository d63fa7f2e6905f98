//! API facade for the course platform.
//!
//! `Api` exposes one method per remote operation and delegates to the typed
//! service for the right header policy: OAuth for token endpoints, logged
//! (token refresh coordinator) for user data, cookie-authenticated for
//! sign-up and password reminders, anonymous for public files.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Url;
use tracing::{debug, info};

use super::factory::ClientFactory;
use super::requests::{NewComment, NewDevice, VoteUpdate};
use super::services::{AnonymousService, LoggedService, OAuthService};
use super::{ApiError, ApiResult};
use crate::auth::{AuthSession, LoginMode, OAuthResponse, SessionContext};
use crate::config::Config;
use crate::models::*;

/// Id sent when a caller asks for an empty id set; the backend rejects an
/// empty filter.
const SENTINEL_ID: i64 = 0;

/// Search target type for course search.
const SEARCH_TYPE_COURSE: &str = "course";

const SUBMISSIONS_ORDER: &str = "desc";

/// Client type reported when registering a device for push notifications.
const DEVICE_CLIENT_TYPE: &str = "android";

/// Social providers that hand out an access token instead of a code.
const ACCESS_TOKEN_PROVIDERS: &[&str] = &["vk", "facebook"];

fn non_empty_ids(ids: &[i64]) -> Vec<i64> {
    if ids.is_empty() {
        vec![SENTINEL_ID]
    } else {
        ids.to_vec()
    }
}

fn non_empty_keys(ids: &[String]) -> Vec<String> {
    if ids.is_empty() {
        vec![SENTINEL_ID.to_string()]
    } else {
        ids.to_vec()
    }
}

/// Client and platform description, `<br>`-separated for the help desk.
fn system_info(user_agent: &str) -> String {
    format!(
        "{}<br>{} {}",
        user_agent,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

pub struct Api {
    factory: ClientFactory,
    context: Arc<SessionContext>,
    config: Arc<Config>,
    logged: LoggedService,
    anonymous: AnonymousService,
}

impl Api {
    pub fn new(config: Config, context: Arc<SessionContext>) -> ApiResult<Self> {
        let config = Arc::new(config);
        let factory = ClientFactory::new(Arc::clone(&config), Arc::clone(&context))?;
        Ok(Self {
            logged: factory.logged()?,
            anonymous: factory.anonymous()?,
            factory,
            context,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Current session, read under the session lock.
    pub async fn session(&self) -> ApiResult<Option<AuthSession>> {
        self.context.read().await.session()
    }

    fn cached_user_id(&self) -> ApiResult<i64> {
        Ok(self.context.profile()?.map(|p| p.id).unwrap_or(0))
    }

    // ===== Authentication =====

    /// OAuth handles are rebuilt per login so the Basic credentials always
    /// match the requested mode.
    fn oauth_for(&self, mode: LoginMode) -> ApiResult<OAuthService> {
        self.factory.oauth(mode)
    }

    async fn store_login(&self, response: OAuthResponse, mode: LoginMode) -> ApiResult<AuthSession> {
        let session = response.into_session(mode, Utc::now());
        let guard = self.context.write().await;
        guard.store_session(&session)?;
        let store = self.context.store();
        store.store_last_login_mode(mode).map_err(ApiError::storage)?;
        // A profile cached for the anonymous session belongs to someone else.
        store.clear_profile().map_err(ApiError::storage)?;
        info!(social = mode.is_social(), "signed in");
        Ok(session)
    }

    pub async fn auth_with_login_password(&self, login: &str, password: &str) -> ApiResult<AuthSession> {
        let oauth = self.oauth_for(LoginMode::Password)?;
        let response = oauth.login_password(login, password).await?;
        self.store_login(response, LoginMode::Password).await
    }

    pub async fn auth_with_code(&self, code: &str) -> ApiResult<AuthSession> {
        let oauth = self.oauth_for(LoginMode::Social)?;
        let response = oauth.token_by_code(code).await?;
        self.store_login(response, LoginMode::Social).await
    }

    pub async fn auth_with_native_code(
        &self,
        code: &str,
        provider: &str,
        email: Option<&str>,
    ) -> ApiResult<AuthSession> {
        let oauth = self.oauth_for(LoginMode::Social)?;
        let code_type = ACCESS_TOKEN_PROVIDERS
            .contains(&provider)
            .then_some("access_token");
        let response = oauth
            .token_by_native_code(provider, code, code_type, email)
            .await?;
        self.store_login(response, LoginMode::Social).await
    }

    pub async fn sign_up(&self, user: &RegistrationUser) -> ApiResult<()> {
        self.factory
            .cookie_authenticated(false)?
            .create_account(user)
            .await
    }

    pub async fn remind_password(&self, email: &str) -> ApiResult<()> {
        self.factory
            .cookie_authenticated(true)?
            .remind_password(email)
            .await
    }

    /// Browser URL that starts the web social login for `provider`.
    pub fn social_login_url(&self, provider: &str) -> ApiResult<Url> {
        let client_id = &self.config.client_credentials(LoginMode::Social).client_id;
        let mut authorize = Url::parse("http://localhost/oauth2/authorize/")
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        authorize
            .query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code");
        let next = format!("/oauth2/authorize/?{}", authorize.query().unwrap_or_default());

        let base = self
            .config
            .base()
            .map_err(|e| ApiError::Configuration(format!("{:#}", e)))?;
        let mut url = base
            .join(&format!("accounts/{}/login", provider))
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        url.query_pairs_mut().append_pair("next", &next);
        Ok(url)
    }

    /// Forget the local session, profile, and cookies.
    pub async fn logout(&self) {
        self.context.write().await.clear_all();
        info!("signed out locally");
    }

    // ===== Courses =====

    pub async fn enrolled_courses(&self, page: i32) -> ApiResult<CoursesResponse> {
        self.logged.enrolled_courses(page).await
    }

    pub async fn popular_courses(&self, page: i32, language: &str) -> ApiResult<CoursesResponse> {
        self.logged.featured_courses(page, language).await
    }

    pub async fn courses(&self, page: i32, ids: &[i64]) -> ApiResult<CoursesResponse> {
        self.logged.courses(Some(page), &non_empty_ids(ids)).await
    }

    pub async fn course(&self, id: i64) -> ApiResult<Option<Course>> {
        let response = self.logged.courses(None, &[id]).await?;
        Ok(response.courses.into_iter().next())
    }

    pub async fn search_courses(&self, page: i32, query: &str) -> ApiResult<SearchResultsResponse> {
        debug!(page, "searching courses");
        self.logged.search(page, query, SEARCH_TYPE_COURSE).await
    }

    pub async fn join_course(&self, course_id: i64) -> ApiResult<()> {
        self.logged.join_course(course_id).await
    }

    pub async fn drop_course(&self, course_id: i64) -> ApiResult<()> {
        if !self.config.can_drop_course {
            return Err(ApiError::Configuration(
                "dropping courses is disabled".to_string(),
            ));
        }
        self.logged.drop_course(course_id).await
    }

    pub async fn course_collections(&self, language: &str) -> ApiResult<CourseCollectionsResponse> {
        self.logged.course_lists(language).await
    }

    pub async fn course_reviews(&self, course_ids: &[i64]) -> ApiResult<CourseReviewsResponse> {
        self.logged.course_reviews(&non_empty_ids(course_ids)).await
    }

    // ===== Structure =====

    pub async fn sections(&self, ids: &[i64]) -> ApiResult<SectionsResponse> {
        self.logged.sections(&non_empty_ids(ids)).await
    }

    pub async fn units(&self, ids: &[i64]) -> ApiResult<UnitsResponse> {
        self.logged.units(&non_empty_ids(ids)).await
    }

    pub async fn unit_by_lesson(&self, lesson_id: i64) -> ApiResult<UnitsResponse> {
        self.logged.unit_by_lesson(lesson_id).await
    }

    pub async fn lessons(&self, ids: &[i64]) -> ApiResult<LessonsResponse> {
        self.logged.lessons(&non_empty_ids(ids)).await
    }

    pub async fn steps(&self, ids: &[i64]) -> ApiResult<StepsResponse> {
        self.logged.steps(&non_empty_ids(ids)).await
    }

    pub async fn progresses(&self, ids: &[String]) -> ApiResult<ProgressesResponse> {
        self.logged.progresses(&non_empty_keys(ids)).await
    }

    pub async fn assignments(&self, ids: &[i64]) -> ApiResult<AssignmentsResponse> {
        self.logged.assignments(&non_empty_ids(ids)).await
    }

    /// Mark a step as viewed, within an assignment when it has one.
    pub async fn post_viewed(&self, assignment: Option<i64>, step: i64) -> ApiResult<()> {
        self.logged.post_view(assignment, step).await
    }

    pub async fn last_step(&self, id: &str) -> ApiResult<LastStepsResponse> {
        self.logged.last_step(id).await
    }

    // ===== Quizzes =====

    pub async fn create_attempt(&self, step_id: i64) -> ApiResult<AttemptsResponse> {
        self.logged.create_attempt(step_id).await
    }

    pub async fn existing_attempts(&self, step_id: i64) -> ApiResult<AttemptsResponse> {
        let user_id = self.cached_user_id()?;
        self.logged.attempts(step_id, user_id).await
    }

    pub async fn create_submission(&self, reply: Reply, attempt_id: i64) -> ApiResult<SubmissionsResponse> {
        self.logged.create_submission(reply, attempt_id).await
    }

    pub async fn submissions(&self, attempt_id: i64) -> ApiResult<SubmissionsResponse> {
        self.logged.submissions(attempt_id, SUBMISSIONS_ORDER).await
    }

    pub async fn submissions_for_step(&self, step_id: i64) -> ApiResult<SubmissionsResponse> {
        self.logged.submissions_for_step(step_id).await
    }

    // ===== Users =====

    /// Fetch the current profile and cache it for later user-scoped calls.
    pub async fn user_profile(&self) -> ApiResult<Option<Profile>> {
        let profile = self.logged.profile().await?.into_profile();
        if let Some(ref profile) = profile {
            self.context.store_profile(profile)?;
        }
        Ok(profile)
    }

    pub async fn users(&self, ids: &[i64]) -> ApiResult<UsersResponse> {
        self.logged.users(&non_empty_ids(ids)).await
    }

    pub async fn email_addresses(&self, ids: &[i64]) -> ApiResult<EmailAddressesResponse> {
        self.logged.email_addresses(&non_empty_ids(ids)).await
    }

    pub async fn user_activities(&self, user_id: i64) -> ApiResult<UserActivitiesResponse> {
        self.logged.user_activities(user_id).await
    }

    pub async fn certificates(&self) -> ApiResult<CertificatesResponse> {
        let user_id = self.cached_user_id()?;
        self.logged.certificates(user_id).await
    }

    // ===== Devices =====

    pub async fn devices(&self) -> ApiResult<DevicesResponse> {
        let user_id = self.cached_user_id()?;
        self.logged.devices(user_id).await
    }

    pub async fn register_device(&self, token: &str, description: &str) -> ApiResult<DevicesResponse> {
        let device = NewDevice {
            registration_id: token.to_string(),
            description: description.to_string(),
            client_type: DEVICE_CLIENT_TYPE.to_string(),
            is_badges_enabled: true,
        };
        self.logged.register_device(device).await
    }

    pub async fn remove_device(&self, device_id: i64) -> ApiResult<()> {
        self.logged.remove_device(device_id).await
    }

    // ===== Notifications =====

    pub async fn notifications(
        &self,
        category: NotificationCategory,
        page: i32,
    ) -> ApiResult<NotificationsResponse> {
        self.logged.notifications(page, category.type_filter()).await
    }

    pub async fn mark_all_notifications_read(&self, category: NotificationCategory) -> ApiResult<()> {
        self.logged
            .mark_notifications_read(category.type_filter())
            .await
    }

    pub async fn set_notification_read(&self, notification_id: i64, is_read: bool) -> ApiResult<()> {
        self.logged
            .update_notification(notification_id, !is_read)
            .await
    }

    // ===== Discussions =====

    pub async fn discussion_proxy(&self, id: &str) -> ApiResult<DiscussionProxiesResponse> {
        self.logged.discussion_proxy(id).await
    }

    pub async fn comments(&self, ids: &[i64]) -> ApiResult<CommentsResponse> {
        self.logged.comments(&non_empty_ids(ids)).await
    }

    /// A comment together with its first page of replies.
    pub async fn comment_with_replies(&self, comment_id: i64) -> ApiResult<CommentsResponse> {
        self.logged.comments(&[comment_id]).await
    }

    pub async fn post_comment(&self, text: &str, target: i64, parent: Option<i64>) -> ApiResult<CommentsResponse> {
        let comment = NewComment {
            target,
            text: text.to_string(),
            parent,
        };
        self.logged.post_comment(comment).await
    }

    pub async fn vote(&self, vote_id: &str, value: Option<VoteValue>) -> ApiResult<VotesResponse> {
        let vote = VoteUpdate {
            id: vote_id.to_string(),
            value,
        };
        self.logged.vote(vote).await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> ApiResult<CommentsResponse> {
        self.logged.delete_comment(comment_id).await
    }

    // ===== Misc =====

    /// Send in-app feedback to the help desk. Line breaks become `<br>` and
    /// the client description is appended to the message.
    pub async fn send_feedback(&self, email: &str, description: &str) -> ApiResult<()> {
        let about = system_info(&self.config.user_agent);
        let description = format!("{}<br><br>{}", description.replace('\n', "<br>"), about);
        self.factory
            .feedback()?
            .send(&self.config.feedback_subject, email, &about, &description)
            .await?;
        info!("feedback sent");
        Ok(())
    }

    pub async fn update_info(&self) -> ApiResult<UpdateInfo> {
        self.anonymous.update_info(&self.config.update_endpoint).await
    }
}
