// src/client/controller.rs

use std::fmt;

use crate::client::api::{ApiError, QuizApi};
use crate::client::store::SessionStore;
use crate::models::{
    problem::{ProblemResponse, SolveResponse},
    user::User,
};

/// Mutually exclusive sub-views of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Problems,
    Leaderboard,
    AddProblem,
    Account,
}

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    NameEntry,
    Main(View),
}

/// Error surfaced by a controller transition.
#[derive(Debug)]
pub enum ControllerError {
    NotLoggedIn,
    AdminRequired,
    AlreadySolved,
    Api(ApiError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::NotLoggedIn => write!(f, "no user is logged in"),
            ControllerError::AdminRequired => write!(f, "only the admin can do this"),
            ControllerError::AlreadySolved => write!(f, "this problem was already solved"),
            ControllerError::Api(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ApiError> for ControllerError {
    fn from(err: ApiError) -> Self {
        ControllerError::Api(err)
    }
}

/// Owns all client state and funnels every mutation through named
/// transitions. Freshness comes from re-fetching after each mutation; the
/// cached lists are never treated as authoritative.
pub struct Controller<A: QuizApi> {
    api: A,
    store: SessionStore,
    screen: Screen,
    current_user: Option<User>,
    users: Vec<User>,
    problems: Vec<ProblemResponse>,
}

impl<A: QuizApi> Controller<A> {
    pub fn new(api: A, store: SessionStore) -> Self {
        Self {
            api,
            store,
            screen: Screen::NameEntry,
            current_user: None,
            users: Vec::new(),
            problems: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Last-fetched leaderboard, service order preserved.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Last-fetched problem list, service order preserved.
    pub fn problems(&self) -> &[ProblemResponse] {
        &self.problems
    }

    /// Rehydrates the persisted session and enters the main screen, or
    /// lands on name entry when no session exists.
    pub async fn start(&mut self) -> Result<(), ControllerError> {
        let Some(saved) = self.store.load() else {
            self.screen = Screen::NameEntry;
            return Ok(());
        };

        self.current_user = Some(saved);
        self.refresh_current_user().await;
        self.screen = Screen::Main(View::Problems);

        let problems = self.refresh_problems().await;
        self.refresh_leaderboard().await;
        problems.map_err(ControllerError::Api)
    }

    /// Identifies (or registers) the user by name and enters the main
    /// screen with fresh lists.
    pub async fn login(&mut self, name: &str) -> Result<(), ControllerError> {
        let user = self.api.login(name).await?;
        if let Err(err) = self.store.save(&user) {
            tracing::warn!("Failed to persist session: {}", err);
        }
        self.current_user = Some(user);
        self.screen = Screen::Main(View::Problems);

        let problems = self.refresh_problems().await;
        self.refresh_leaderboard().await;
        problems.map_err(ControllerError::Api)
    }

    /// Clears the local identity and returns to name entry.
    pub fn logout(&mut self) {
        self.current_user = None;
        self.users.clear();
        self.problems.clear();
        self.store.clear();
        self.screen = Screen::NameEntry;
    }

    /// Switches the main sub-view. Entering the problems view re-fetches
    /// problems; entering the leaderboard re-fetches users (that fetch
    /// failing is logged only, the stale list stays). The add-problem view
    /// is admin-gated and falls through with an error, screen unchanged.
    pub async fn show(&mut self, view: View) -> Result<(), ControllerError> {
        let user = self.current_user.as_ref().ok_or(ControllerError::NotLoggedIn)?;

        match view {
            View::AddProblem => {
                if !user.is_admin {
                    tracing::warn!("Add-problem view requested by non-admin user {}", user.id);
                    return Err(ControllerError::AdminRequired);
                }
                self.screen = Screen::Main(View::AddProblem);
                Ok(())
            }
            View::Problems => {
                self.screen = Screen::Main(View::Problems);
                self.refresh_problems().await.map_err(ControllerError::Api)
            }
            View::Leaderboard => {
                self.screen = Screen::Main(View::Leaderboard);
                self.refresh_leaderboard().await;
                Ok(())
            }
            View::Account => {
                self.screen = Screen::Main(View::Account);
                Ok(())
            }
        }
    }

    /// Whether the current user already appears in the solver list of the
    /// problem for `date` (value equality on the user id). Drives disabling
    /// the answer options in the detail view.
    pub fn has_solved(&self, date: &str) -> bool {
        let Some(user) = &self.current_user else {
            return false;
        };
        self.problems
            .iter()
            .filter(|p| p.date == date)
            .any(|p| p.solvers.iter().any(|s| s.user_id == user.id))
    }

    /// Submits an answer, then re-fetches problems, users, and the current
    /// user record regardless of the outcome, so local state tracks the
    /// service even when the submission fails.
    pub async fn submit_answer(
        &mut self,
        date: &str,
        selected: i64,
    ) -> Result<SolveResponse, ControllerError> {
        let user_id = self
            .current_user
            .as_ref()
            .ok_or(ControllerError::NotLoggedIn)?
            .id;

        if self.has_solved(date) {
            return Err(ControllerError::AlreadySolved);
        }

        let outcome = self.api.submit_answer(date, user_id, selected).await;

        if let Err(err) = self.refresh_problems().await {
            tracing::warn!("Failed to refresh problems after submission: {}", err);
        }
        self.refresh_leaderboard().await;
        self.refresh_current_user().await;

        outcome.map_err(ControllerError::Api)
    }

    /// Runs the admin credential form. On success the promoted record
    /// replaces and re-persists the local user; on failure nothing changes.
    pub async fn authenticate_admin(
        &mut self,
        id: &str,
        password: &str,
    ) -> Result<(), ControllerError> {
        let current = self.current_user.as_ref().ok_or(ControllerError::NotLoggedIn)?;

        let promoted = self.api.authenticate_admin(id, password, current.id).await?;
        if let Err(err) = self.store.save(&promoted) {
            tracing::warn!("Failed to persist session: {}", err);
        }
        self.current_user = Some(promoted);
        Ok(())
    }

    /// Creates a new daily problem (admin only) and returns to the problem
    /// list with a fresh fetch.
    pub async fn create_problem(
        &mut self,
        date: &str,
        question: &crate::models::problem::QuestionPayload,
        answer: i64,
    ) -> Result<(), ControllerError> {
        let user = self.current_user.as_ref().ok_or(ControllerError::NotLoggedIn)?;
        if !user.is_admin {
            return Err(ControllerError::AdminRequired);
        }

        self.api.create_problem(date, question, answer).await?;
        self.screen = Screen::Main(View::Problems);
        self.refresh_problems().await.map_err(ControllerError::Api)
    }

    /// Deletes the problem for a date (admin only) and re-fetches the list.
    pub async fn delete_problem(&mut self, date: &str) -> Result<(), ControllerError> {
        let user = self.current_user.as_ref().ok_or(ControllerError::NotLoggedIn)?;
        if !user.is_admin {
            return Err(ControllerError::AdminRequired);
        }

        self.api.delete_problem(date).await?;
        self.refresh_problems().await.map_err(ControllerError::Api)
    }

    /// Changes the current user's display name and re-persists it.
    pub async fn rename(&mut self, new_name: &str) -> Result<(), ControllerError> {
        let current = self.current_user.as_ref().ok_or(ControllerError::NotLoggedIn)?;

        let updated = self.api.rename_user(current.id, new_name).await?;
        if let Err(err) = self.store.save(&updated) {
            tracing::warn!("Failed to persist session: {}", err);
        }
        self.current_user = Some(updated);
        Ok(())
    }

    async fn refresh_problems(&mut self) -> Result<(), ApiError> {
        self.problems = self.api.list_problems().await?;
        Ok(())
    }

    // Leaderboard staleness is non-critical: failures are logged, never
    // surfaced.
    async fn refresh_leaderboard(&mut self) {
        match self.api.list_users().await {
            Ok(users) => self.users = users,
            Err(err) => tracing::warn!("Failed to refresh leaderboard: {}", err),
        }
    }

    async fn refresh_current_user(&mut self) {
        let Some(user) = &self.current_user else {
            return;
        };
        match self.api.get_user(user.id).await {
            Ok(fresh) => {
                if let Err(err) = self.store.save(&fresh) {
                    tracing::warn!("Failed to persist session: {}", err);
                }
                self.current_user = Some(fresh);
            }
            Err(err) => {
                tracing::warn!("Failed to refresh current user, keeping cached copy: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::{ApiError, QuizApi};
    use crate::models::problem::{
        ProblemResponse, QuestionBody, QuestionOption, QuestionPayload, Solver, SolveResponse,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    const ADMIN_ID: &str = "1234aa";
    const ADMIN_PASSWORD: &str = "wj211@";

    #[derive(Default)]
    struct MockState {
        users: Vec<User>,
        problems: Vec<ProblemResponse>,
        list_problem_calls: usize,
        submit_calls: usize,
        fail_submissions: bool,
    }

    #[derive(Clone, Default)]
    struct MockApi {
        state: Arc<Mutex<MockState>>,
    }

    fn question() -> QuestionBody {
        QuestionBody::Structured(QuestionPayload {
            text: Some("2+2?".to_string()),
            image: None,
            options: vec![
                QuestionOption { text: Some("3".to_string()), image: None },
                QuestionOption { text: Some("4".to_string()), image: None },
            ],
        })
    }

    fn make_user(id: i64, name: &str) -> User {
        User {
            id,
            user_code: format!("code-{}", id),
            name: name.to_string(),
            password: None,
            is_admin: false,
            score: 0,
            latest_quiz_at: None,
        }
    }

    #[async_trait]
    impl QuizApi for MockApi {
        async fn login(&self, name: &str) -> Result<User, ApiError> {
            let mut state = self.state.lock().unwrap();
            if let Some(user) = state.users.iter().find(|u| u.name == name) {
                return Ok(user.clone());
            }
            let id = state.users.len() as i64 + 1;
            let user = make_user(id, name);
            state.users.push(user.clone());
            Ok(user)
        }

        async fn get_user(&self, id: i64) -> Result<User, ApiError> {
            let state = self.state.lock().unwrap();
            state
                .users
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(ApiError::Api { status: 404, message: "User not found".to_string() })
        }

        async fn rename_user(&self, id: i64, name: &str) -> Result<User, ApiError> {
            let mut state = self.state.lock().unwrap();
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(ApiError::Api { status: 404, message: "User not found".to_string() })?;
            user.name = name.to_string();
            Ok(user.clone())
        }

        async fn authenticate_admin(
            &self,
            id: &str,
            password: &str,
            current_user_id: i64,
        ) -> Result<User, ApiError> {
            if id != ADMIN_ID || password != ADMIN_PASSWORD {
                return Err(ApiError::Api { status: 401, message: "mismatch".to_string() });
            }
            let mut state = self.state.lock().unwrap();
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == current_user_id)
                .ok_or(ApiError::Api { status: 404, message: "User not found".to_string() })?;
            user.is_admin = true;
            user.user_code = ADMIN_ID.to_string();
            Ok(user.clone())
        }

        async fn list_users(&self) -> Result<Vec<User>, ApiError> {
            let state = self.state.lock().unwrap();
            Ok(state.users.iter().filter(|u| !u.is_admin).cloned().collect())
        }

        async fn list_problems(&self) -> Result<Vec<ProblemResponse>, ApiError> {
            let mut state = self.state.lock().unwrap();
            state.list_problem_calls += 1;
            Ok(state.problems.clone())
        }

        async fn create_problem(
            &self,
            date: &str,
            _question: &QuestionPayload,
            answer: i64,
        ) -> Result<ProblemResponse, ApiError> {
            let mut state = self.state.lock().unwrap();
            let problem = ProblemResponse {
                id: state.problems.len() as i64 + 1,
                date: date.to_string(),
                question: question(),
                answer,
                solvers: Vec::new(),
            };
            state.problems.push(problem.clone());
            Ok(problem)
        }

        async fn delete_problem(&self, date: &str) -> Result<(), ApiError> {
            let mut state = self.state.lock().unwrap();
            state.problems.retain(|p| p.date != date);
            Ok(())
        }

        async fn submit_answer(
            &self,
            date: &str,
            user_id: i64,
            answer: i64,
        ) -> Result<SolveResponse, ApiError> {
            let mut state = self.state.lock().unwrap();
            state.submit_calls += 1;
            if state.fail_submissions {
                return Err(ApiError::Transport("connection reset".to_string()));
            }
            let correct = {
                let problem = state
                    .problems
                    .iter_mut()
                    .find(|p| p.date == date)
                    .ok_or(ApiError::Api { status: 404, message: "not found".to_string() })?;
                let correct = problem.answer == answer;
                problem.solvers.push(Solver {
                    user_id,
                    name: "someone".to_string(),
                    is_correct: correct,
                    solved_at: Utc::now(),
                });
                correct
            };
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or(ApiError::Api { status: 404, message: "not found".to_string() })?;
            if correct {
                user.score += 1;
                user.latest_quiz_at = Some(Utc::now());
            }
            Ok(SolveResponse { success: true, is_correct: correct, new_score: user.score })
        }
    }

    fn temp_store() -> SessionStore {
        let path = std::env::temp_dir().join(format!("quiz-ctl-{}.json", uuid::Uuid::new_v4()));
        SessionStore::new(path)
    }

    fn controller() -> (Controller<MockApi>, Arc<Mutex<MockState>>) {
        let api = MockApi::default();
        let state = api.state.clone();
        (Controller::new(api, temp_store()), state)
    }

    #[tokio::test]
    async fn start_without_session_lands_on_name_entry() {
        let (mut ctl, _) = controller();
        ctl.start().await.unwrap();
        assert_eq!(ctl.screen(), Screen::NameEntry);
        assert!(ctl.current_user().is_none());
    }

    #[tokio::test]
    async fn login_enters_main_and_persists_session() {
        let (mut ctl, _) = controller();
        ctl.login("mina").await.unwrap();

        assert_eq!(ctl.screen(), Screen::Main(View::Problems));
        assert_eq!(ctl.current_user().unwrap().name, "mina");
        assert!(ctl.store.load().is_some(), "session should be persisted");
    }

    #[tokio::test]
    async fn start_with_session_refreshes_user_and_enters_main() {
        let (mut ctl, state) = controller();
        // A stale local copy of a user the service already knows with a
        // higher score.
        let mut on_server = make_user(1, "mina");
        on_server.score = 5;
        state.lock().unwrap().users.push(on_server.clone());

        let mut stale = on_server;
        stale.score = 2;
        ctl.store.save(&stale).unwrap();

        ctl.start().await.unwrap();

        assert_eq!(ctl.screen(), Screen::Main(View::Problems));
        assert_eq!(ctl.current_user().unwrap().score, 5);
    }

    #[tokio::test]
    async fn add_problem_view_is_admin_gated() {
        let (mut ctl, _) = controller();
        ctl.login("mina").await.unwrap();

        let denied = ctl.show(View::AddProblem).await;
        assert!(matches!(denied, Err(ControllerError::AdminRequired)));
        assert_eq!(ctl.screen(), Screen::Main(View::Problems), "screen unchanged");

        ctl.authenticate_admin(ADMIN_ID, ADMIN_PASSWORD).await.unwrap();
        ctl.show(View::AddProblem).await.unwrap();
        assert_eq!(ctl.screen(), Screen::Main(View::AddProblem));
    }

    #[tokio::test]
    async fn admin_auth_failure_changes_nothing() {
        let (mut ctl, _) = controller();
        ctl.login("mina").await.unwrap();

        let result = ctl.authenticate_admin(ADMIN_ID, "wrong").await;
        assert!(matches!(result, Err(ControllerError::Api(ApiError::Api { status: 401, .. }))));
        assert!(!ctl.current_user().unwrap().is_admin);
    }

    #[tokio::test]
    async fn local_guard_blocks_second_submission_without_a_call() {
        let (mut ctl, state) = controller();
        ctl.login("mina").await.unwrap();

        state.lock().unwrap().problems.push(ProblemResponse {
            id: 1,
            date: "2024-01-01".to_string(),
            question: question(),
            answer: 2,
            solvers: Vec::new(),
        });
        ctl.show(View::Problems).await.unwrap();

        let outcome = ctl.submit_answer("2024-01-01", 2).await.unwrap();
        assert!(outcome.is_correct);
        assert_eq!(ctl.current_user().unwrap().score, 1);
        assert!(ctl.has_solved("2024-01-01"));

        let calls_before = state.lock().unwrap().submit_calls;
        let second = ctl.submit_answer("2024-01-01", 2).await;
        assert!(matches!(second, Err(ControllerError::AlreadySolved)));
        assert_eq!(state.lock().unwrap().submit_calls, calls_before, "no network call");
    }

    #[tokio::test]
    async fn create_and_delete_problem_require_admin() {
        let (mut ctl, _) = controller();
        ctl.login("mina").await.unwrap();

        let payload = QuestionPayload {
            text: Some("2+2?".to_string()),
            image: None,
            options: vec![
                QuestionOption { text: Some("3".to_string()), image: None },
                QuestionOption { text: Some("4".to_string()), image: None },
            ],
        };

        let denied = ctl.create_problem("2024-01-02", &payload, 2).await;
        assert!(matches!(denied, Err(ControllerError::AdminRequired)));

        ctl.authenticate_admin(ADMIN_ID, ADMIN_PASSWORD).await.unwrap();
        ctl.create_problem("2024-01-02", &payload, 2).await.unwrap();
        assert_eq!(ctl.problems().len(), 1);
        assert_eq!(ctl.screen(), Screen::Main(View::Problems));

        ctl.delete_problem("2024-01-02").await.unwrap();
        assert!(ctl.problems().is_empty());
    }

    #[tokio::test]
    async fn failed_submission_still_refreshes_state() {
        let (mut ctl, state) = controller();
        ctl.login("mina").await.unwrap();
        state.lock().unwrap().fail_submissions = true;

        let calls_before = state.lock().unwrap().list_problem_calls;
        let result = ctl.submit_answer("2024-01-01", 1).await;
        assert!(matches!(result, Err(ControllerError::Api(_))));
        assert!(
            state.lock().unwrap().list_problem_calls > calls_before,
            "problems must be re-fetched even when the submission fails"
        );
    }

    #[tokio::test]
    async fn logout_clears_identity_and_session() {
        let (mut ctl, _) = controller();
        ctl.login("mina").await.unwrap();
        assert!(ctl.store.load().is_some());

        ctl.logout();
        assert_eq!(ctl.screen(), Screen::NameEntry);
        assert!(ctl.current_user().is_none());
        assert!(ctl.store.load().is_none());
        assert!(ctl.problems().is_empty());
        assert!(ctl.users().is_empty());
    }

    #[tokio::test]
    async fn rename_updates_and_persists() {
        let (mut ctl, _) = controller();
        ctl.login("mina").await.unwrap();
        ctl.rename("mina2").await.unwrap();

        assert_eq!(ctl.current_user().unwrap().name, "mina2");
        assert_eq!(ctl.store.load().unwrap().name, "mina2");
    }
}
