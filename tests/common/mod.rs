#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use moviedb::auth::{hash_password, issue_token};
use moviedb::config::Config;
use moviedb::mail::{MailError, MailMessage, Mailer};
use moviedb::models::{Movie, NewMovie, User};
use moviedb::repo::inmem::InMemRepo;
use moviedb::AppState;

pub const SECRET: &str = "integration-test-secret-32-bytes-long!";
pub const PASSWORD: &str = "password123";

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct Ctx {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

/// Fresh volatile store and a cheap bcrypt cost.
pub fn ctx() -> Ctx {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        repo: Arc::new(InMemRepo::new()),
        mailer: mailer.clone(),
        config: Arc::new(Config::new(SECRET).with_bcrypt_cost(4)),
    };
    Ctx { state, mailer }
}

/// Insert a user directly and return `(id, "Bearer <token>")`.
pub async fn user(state: &AppState, name: &str, is_admin: bool) -> (String, String) {
    let hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
    let user = User::new(name.to_string(), format!("{name}@example.com"), hash, is_admin);
    let user = state.repo.users().insert(user).await.unwrap();
    let token = issue_token(&state.config, &user.id).unwrap();
    (user.id, format!("Bearer {token}"))
}

/// Insert a movie described as the JSON body of `POST /movies`.
pub async fn movie(state: &AppState, body: serde_json::Value) -> Movie {
    let new: NewMovie = serde_json::from_value(body).unwrap();
    state.repo.movies().insert(new.into_movie().unwrap()).await.unwrap()
}

/// Build the full application around a state.
macro_rules! app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .configure(moviedb::config),
        )
        .await
    };
}

/// Send a `TestRequest` and return `(status, json body)`; bodies that are
/// not JSON come back as `Null`.
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let bytes = actix_web::test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }};
}
