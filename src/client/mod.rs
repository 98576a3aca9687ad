// src/client/mod.rs

//! Client-side state controller for the daily quiz.
//!
//! `Controller` owns the current user, the cached problem and user lists,
//! and the active screen, and funnels every mutation through named
//! transition methods. It talks to the backend through the `QuizApi` trait,
//! so the whole state machine is testable without a rendering surface or a
//! running server.

pub mod api;
pub mod controller;
pub mod store;

pub use api::{ApiError, HttpQuizApi, QuizApi};
pub use controller::{Controller, ControllerError, Screen, View};
pub use store::SessionStore;
