//! In-process fake of the remote Account Service.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. Dropping the harness stops the server.

use std::collections::BTreeMap;
use std::future::Future;
use std::net::TcpListener;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::header;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;
use url::Url;

/// Request observed by the fake service.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub user_agent: Option<String>,
}

#[derive(Default)]
struct FakeState {
    accounts: Mutex<BTreeMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    next_id: Mutex<u64>,
}

impl FakeState {
    fn record(&self, req: &HttpRequest, body: Option<Value>) {
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: req.method().to_string(),
                path: req.path().to_owned(),
                body,
                user_agent,
            });
    }

    fn account(&self, id: &str) -> Option<Value> {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn put(&self, account: Value) {
        let id = account["accountId"].as_str().unwrap_or_default().to_owned();
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, account);
    }
}

pub fn account_json(id: &str, holder: &str, balance: f64, active: bool) -> Value {
    json!({
        "accountId": id,
        "accountHolder": holder,
        "balance": balance,
        "active": active,
    })
}

#[expect(
    clippy::float_arithmetic,
    reason = "the fake service owns the authoritative balances"
)]
fn adjust(state: &FakeState, id: &str, amount: f64, credit: bool) -> HttpResponse {
    let Some(mut account) = state.account(id) else {
        return HttpResponse::NotFound().body("account not found");
    };
    let current = account["balance"].as_f64().unwrap_or_default();
    let balance = if credit {
        current + amount
    } else {
        current - amount
    };
    if balance < 0.0 {
        return HttpResponse::UnprocessableEntity().json(json!({ "error": "insufficient funds" }));
    }
    account["balance"] = json!(balance);
    state.put(account.clone());
    HttpResponse::Ok().json(account)
}

async fn list_accounts(state: web::Data<FakeState>, req: HttpRequest) -> HttpResponse {
    state.record(&req, None);
    let accounts: Vec<Value> = state
        .accounts
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .cloned()
        .collect();
    HttpResponse::Ok().json(accounts)
}

async fn get_account(
    state: web::Data<FakeState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    state.record(&req, None);
    match state.account(&path) {
        Some(account) => HttpResponse::Ok().json(account),
        None => HttpResponse::NotFound().body("account not found"),
    }
}

async fn create_account(
    state: web::Data<FakeState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    let body = body.into_inner();
    state.record(&req, Some(body.clone()));
    let id = {
        let mut next = state.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        *next += 1;
        format!("acc-new-{next}")
    };
    let account = account_json(
        &id,
        body["accountHolder"].as_str().unwrap_or_default(),
        body["balance"].as_f64().unwrap_or_default(),
        body["active"].as_bool().unwrap_or_default(),
    );
    state.put(account.clone());
    HttpResponse::Created().json(account)
}

async fn deposit(
    state: web::Data<FakeState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    let body = body.into_inner();
    state.record(&req, Some(body.clone()));
    adjust(&state, &path, body["amount"].as_f64().unwrap_or_default(), true)
}

async fn withdraw(
    state: web::Data<FakeState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    let body = body.into_inner();
    state.record(&req, Some(body.clone()));
    adjust(&state, &path, body["amount"].as_f64().unwrap_or_default(), false)
}

async fn transfer(
    state: web::Data<FakeState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    let body = body.into_inner();
    state.record(&req, Some(body.clone()));
    let from = body["fromAccountId"].as_str().unwrap_or_default();
    let to = body["toAccountId"].as_str().unwrap_or_default();
    let amount = body["amount"].as_f64().unwrap_or_default();
    if state.account(to).is_none() {
        return HttpResponse::NotFound().body("destination account not found");
    }
    let debited = adjust(&state, from, amount, false);
    if !debited.status().is_success() {
        return debited;
    }
    adjust(&state, to, amount, true);
    // The real service answers with a bare boolean.
    HttpResponse::Ok().json(true)
}

async fn malformed_list(state: web::Data<FakeState>, req: HttpRequest) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok().json(json!({ "accounts": [] }))
}

async fn malformed_account(state: web::Data<FakeState>, req: HttpRequest) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok().json(json!({ "accountId": "acc-1", "accountHolder": "Alice" }))
}

async fn slow_list(state: web::Data<FakeState>, req: HttpRequest) -> HttpResponse {
    state.record(&req, None);
    actix_web::rt::time::sleep(Duration::from_secs(2)).await;
    HttpResponse::Ok().json(Vec::<Value>::new())
}

/// Running fake service bound to an ephemeral port.
pub struct FakeAccountService {
    runtime: Runtime,
    local: LocalSet,
    base_url: String,
    server: ServerHandle,
    state: web::Data<FakeState>,
}

impl FakeAccountService {
    /// Start the fake with `accounts` preloaded.
    pub fn start(accounts: impl IntoIterator<Item = Value>) -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let local = LocalSet::new();
        let state = web::Data::new(FakeState::default());
        for account in accounts {
            state.put(account);
        }

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local address");
        let app_state = state.clone();
        let server = local.block_on(&runtime, async move {
            let server = HttpServer::new(move || {
                let api = web::scope("/api")
                    .route("/accounts", web::get().to(list_accounts))
                    .route("/accounts", web::post().to(create_account))
                    .route("/accounts/transfer", web::post().to(transfer))
                    .route("/accounts/{id}", web::get().to(get_account))
                    .route("/accounts/{id}/deposit", web::post().to(deposit))
                    .route("/accounts/{id}/withdraw", web::post().to(withdraw));
                let broken = web::scope("/broken")
                    .route("/accounts", web::get().to(malformed_list))
                    .route("/accounts/{id}", web::get().to(malformed_account));
                let slow = web::scope("/slow").route("/accounts", web::get().to(slow_list));

                App::new()
                    .app_data(app_state.clone())
                    .service(api)
                    .service(broken)
                    .service(slow)
            })
            .disable_signals()
            .shutdown_timeout(1)
            .workers(1)
            .listen(listener)
            .expect("listen on ephemeral port")
            .run();
            let handle = server.handle();
            actix_web::rt::spawn(server);
            handle
        });

        Self {
            runtime,
            local,
            base_url: format!("http://{addr}"),
            server,
            state,
        }
    }

    /// URL of the API root under `prefix`, e.g. `/api`.
    pub fn url(&self, prefix: &str) -> Url {
        Url::parse(&format!("{}{prefix}", self.base_url)).expect("valid fake URL")
    }

    /// Drive `future` on the harness runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.local.block_on(&self.runtime, future)
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests matching `method` and `path`.
    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    /// Server-side view of an account.
    pub fn account(&self, id: &str) -> Option<Value> {
        self.state.account(id)
    }
}

impl Drop for FakeAccountService {
    fn drop(&mut self) {
        let server = self.server.clone();
        self.local.block_on(&self.runtime, async move {
            server.stop(true).await;
        });
    }
}
