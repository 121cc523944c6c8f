#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Html };
use tera::{Context, Tera};

use crate::utils::errors::Errors;
use crate::utils::response_store::ResponseStore;

// The page is rendered once at startup, never per request.
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct IndexApi {
    page: String,
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl IndexApi {
    #[oai(path = "/", method = "get")]
    async fn get_index(&self) -> Html<String> {
        Html(self.page.clone())
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl IndexApi {
    pub fn new(page: String) -> Self {
        Self {page}
    }
}

// ---------------------------------------------------------------------------
// render_landing_page:
// ---------------------------------------------------------------------------
/** Fill in the landing page template with the title and the loaded
 * categories.  Values are HTML escaped.
 */
pub fn render_landing_page(title: &str, store: &ResponseStore) -> Result<String, Errors> {
    let categories: Vec<&str> = store.categories().collect();
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("categories", &categories);

    Tera::one_off(INDEX_TEMPLATE, &context, true)
        .map_err(|e| Errors::TemplateError(format!("{:?}", e)))
}
