#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use log::info;
use poem::{listener::TcpListener, Route};
use poem_openapi::OpenApiService;

// Oracle Utilities
use crate::api::get_answer::GetAnswerApi;
use crate::api::index::{render_landing_page, IndexApi};
use crate::api::version::VersionApi;
use crate::utils::config::{init_log, init_runtime_context, Config, RuntimeCtx};
use crate::utils::errors::Errors;
use crate::utils::picker::make_picker;
use crate::utils::response_store::ResponseStore;

// Modules
mod api;
mod utils;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "PixelOracle"; // for poem logging

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    // --------------- Initialize Oracle --------------
    // Announce ourselves.
    println!("Starting pixel_oracle!");

    // Any configuration or responses problem aborts startup.
    let ctx = oracle_init()?;
    if ctx.oracle_args.check_config {
        info!("Configuration check passed: {} categories in {}.",
              ctx.store.len(), ctx.responses_file);
        return Ok(());
    }

    // --------------- Main Loop Set Up ---------------
    let app = make_app(&ctx.parms.config, ctx.store.clone())?;
    let addr = format!("{}{}", "0.0.0.0:", ctx.parms.config.http_port);
    info!("{} listening on {}.", SERVER_NAME, addr);

    // ------------------ Main Loop -------------------
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await?;
    Ok(())
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// oracle_init:
// ---------------------------------------------------------------------------
/** Initialize logging, then read the parameters and load the responses. */
fn oracle_init() -> Result<RuntimeCtx> {
    // Configure our log.
    init_log()?;

    // Log build info.
    print_version_info();

    let ctx = init_runtime_context()?;
    info!("{}", Errors::InputParms(format!("{:#?}", ctx)));
    Ok(ctx)
}

// ---------------------------------------------------------------------------
// make_app:
// ---------------------------------------------------------------------------
/** Build the routes.  The store and picker are injected into the handlers;
 * the landing page is rendered here, once.
 */
fn make_app(config: &Config, store: Arc<ResponseStore>) -> Result<Route> {
    let page = render_landing_page(&config.title, &store)?;
    let picker = make_picker(config.random_seed);

    // Assign base URL advertised in the openapi document.
    let server_url = format!("{}:{}", config.http_addr, config.http_port);

    let endpoints = (IndexApi::new(page), GetAnswerApi::new(store, picker), VersionApi);
    let api_service =
        OpenApiService::new(endpoints, config.title.as_str(), env!("CARGO_PKG_VERSION"))
            .server(server_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    Ok(Route::new()
        .nest("/docs", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
        .nest("/", api_service))
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    // Log build info.
    info!("\n*** Running PIXEL_ORACLE={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}.",
          option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
          env!("GIT_BRANCH"),
          env!("GIT_COMMIT_SHORT"),
          env!("GIT_DIRTY"),
          env!("SOURCE_TIMESTAMP"),
          env!("RUSTC_VERSION"));
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::{http::StatusCode, test::TestClient};
    use serde_json::{json, Value};

    fn app(json: &str, seed: Option<u64>) -> TestClient<Route> {
        let store = Arc::new(ResponseStore::from_json_str(json, "test").unwrap());
        let config = Config {random_seed: seed, ..Config::default()};
        TestClient::new(make_app(&config, store).unwrap())
    }

    #[tokio::test]
    async fn landing_page_served() {
        let cli = app(r#"{"greeting": ["hi", "hello"]}"#, None);
        let resp = cli.get("/").send().await;
        resp.assert_status_is_ok();
        let page = resp.0.into_body().into_string().await.unwrap();
        assert!(page.contains("greeting"));
    }

    #[tokio::test]
    async fn landing_page_served_without_categories() {
        let cli = app("{}", None);
        cli.get("/").send().await.assert_status_is_ok();
    }

    #[tokio::test]
    async fn answers_through_full_app() {
        let cli = app(r#"{"greeting": ["hi", "hello"]}"#, None);
        for _ in 0..20 {
            let resp = cli.post("/get_answer").body_json(&json!({"category": "greeting"})).send().await;
            resp.assert_status_is_ok();
            let text = resp.0.into_body().into_string().await.unwrap();
            let body: Value = serde_json::from_str(&text).unwrap();
            let answer = body["answer"].as_str().unwrap();
            assert!(answer == "hi" || answer == "hello");
        }

        let resp = cli.post("/get_answer").body_json(&json!({"category": "farewell"})).send().await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({"answer": "Invalid category."})).await;
    }

    #[tokio::test]
    async fn seeded_apps_agree() {
        let doc = r#"{"fortune": ["a", "b", "c", "d", "e", "f", "g", "h"]}"#;
        let cli1 = app(doc, Some(11));
        let cli2 = app(doc, Some(11));
        for _ in 0..10 {
            let r1 = cli1.post("/get_answer").body_json(&json!({"category": "fortune"})).send().await;
            let r2 = cli2.post("/get_answer").body_json(&json!({"category": "fortune"})).send().await;
            let a1 = r1.0.into_body().into_string().await.unwrap();
            let a2 = r2.0.into_body().into_string().await.unwrap();
            assert_eq!(a1, a2);
        }
    }

    #[tokio::test]
    async fn openapi_spec_served() {
        let cli = app(r#"{"greeting": ["hi"]}"#, None);
        let resp = cli.get("/spec").send().await;
        resp.assert_status(StatusCode::OK);
        let text = resp.0.into_body().into_string().await.unwrap();
        let spec: Value = serde_json::from_str(&text).unwrap();
        assert!(spec["paths"].get("/get_answer").is_some());
        assert!(spec["paths"].get("/version").is_some());
    }
}
