//! Data models for the course platform.
//!
//! This module contains the records returned by the REST API:
//!
//! - Course structure: `Course`, `Section`, `Unit`, `Lesson`, `Step`, `Progress`
//! - Quizzes: `Attempt`, `Submission`, `Reply`
//! - Discussions: `Comment`, `Vote`, `Notification`
//! - Users: `Profile`, `User`, `Device`, `Certificate`
//! - Response envelopes in `responses`

pub mod course;
pub mod discussion;
pub mod quiz;
pub mod responses;
pub mod user;

pub use course::{
    Assignment, Block, Course, CourseCollection, CourseReview, LastStep, Lesson, Progress,
    SearchResult, Section, Step, Unit,
};
pub use discussion::{Comment, DiscussionProxy, Notification, NotificationCategory, Vote, VoteValue};
pub use quiz::{Attempt, Reply, Submission, SubmissionStatus};
pub use responses::*;
pub use user::{
    Certificate, Device, EmailAddress, Profile, RegistrationUser, UpdateInfo, User, UserActivity,
};
