/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Greeting and health check endpoints
/// - `auth`: Login, registration, password reset and verification
/// - `users`: Account read and update endpoints
/// - `posts`: Upload, feed and delete endpoints

pub mod auth;
pub mod health;
pub mod posts;
pub mod users;
