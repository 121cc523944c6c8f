#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use log::debug;

use crate::utils::errors::{Errors, HttpResult};
use crate::utils::oracle_utils::{self, RequestDebug};
use crate::utils::picker::AnswerPicker;
use crate::utils::response_store::ResponseStore;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct GetAnswerApi {
    store: Arc<ResponseStore>,
    picker: Arc<dyn AnswerPicker>,
}

// Both fields are optional.  The question is carried by the web client but
// has no influence on the answer.
#[derive(Object)]
struct ReqGetAnswer
{
    category: Option<String>,
    question: Option<String>,
}

#[derive(Object, Debug)]
pub struct RespGetAnswer
{
    answer: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqGetAnswer {
    type Req = ReqGetAnswer;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    category: ");
        s.push_str(self.category.as_deref().unwrap_or("<none>"));
        s.push_str("\n    question: ");
        s.push_str(self.question.as_deref().unwrap_or("<none>"));
        s
    }
}

// ------------------- HTTP Status Codes -------------------
// Unknown categories are reported in a 200 response.  Only bodies that
// can't be parsed get a 400.
#[derive(Debug, ApiResponse)]
#[oai(bad_request_handler = "bad_request_handler")]
enum OracleResponse {
    #[oai(status = 200)]
    Http200(Json<RespGetAnswer>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
}

fn make_http_200(resp: RespGetAnswer) -> OracleResponse {
    OracleResponse::Http200(Json(resp))
}
fn make_http_400(msg: String) -> OracleResponse {
    OracleResponse::Http400(Json(HttpResult::new(400.to_string(), msg)))
}

// Invoked by poem-openapi when the request body can't be extracted.
fn bad_request_handler(err: poem::Error) -> OracleResponse {
    let msg = format!("Malformed request: {}", err);
    debug!("{}", msg);
    make_http_400(msg)
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl GetAnswerApi {
    #[oai(path = "/get_answer", method = "post")]
    async fn get_answer_api(&self, http_req: &Request, req: Json<ReqGetAnswer>) -> OracleResponse {
        make_http_200(RespGetAnswer::process(http_req, &req, &self.store, self.picker.as_ref()))
    }
}

impl GetAnswerApi {
    pub fn new(store: Arc<ResponseStore>, picker: Arc<dyn AnswerPicker>) -> Self {
        Self {store, picker}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespGetAnswer {
    fn new(answer: &str) -> Self {
        Self {answer: answer.to_string()}
    }

    /// Process the request.  Invalid categories are answered in-band.
    fn process(http_req: &Request, req: &ReqGetAnswer, store: &ResponseStore,
               picker: &dyn AnswerPicker) -> RespGetAnswer {
        // Conditional logging depending on log level.
        oracle_utils::debug_request(http_req, req);

        match select_answer(req.category.as_deref(), store, picker) {
            Ok(answer) => Self::new(answer),
            Err(e) => {
                if let Errors::InvalidCategory(c) = &e {
                    debug!("Rejected category {:?}.", c);
                }
                Self::new(&e.to_string())
            }
        }
    }
}

// ***************************************************************************
//                          Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// select_answer:
// ---------------------------------------------------------------------------
/** Pick one of the answers configured for the category.  A missing, empty or
 * unknown category is an InvalidCategory error.
 */
pub fn select_answer<'a>(category: Option<&str>, store: &'a ResponseStore,
                         picker: &dyn AnswerPicker) -> Result<&'a str, Errors> {
    let category = match category {
        Some(c) if !c.is_empty() => c,
        _ => return Err(Errors::InvalidCategory(String::new())),
    };

    let answers = store.lookup(category)
        .ok_or_else(|| Errors::InvalidCategory(category.to_string()))?;
    picker.choose(answers)
        .map(|a| a.as_str())
        .ok_or_else(|| Errors::InvalidCategory(category.to_string()))
}
