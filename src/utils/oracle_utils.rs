#![forbid(unsafe_code)]

use path_absolutize::Absolutize;
use std::ops::Deref;
use std::path::Path;

use poem::Request;

use log::{debug, LevelFilter};

// ***************************************************************************
// GENERAL PUBLIC FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_absolute_path:
// ---------------------------------------------------------------------------
/** Replace tilde (~) and environment variable values in a path name and
 * then construct the absolute path name.  Unlike canonicalize, absolutize
 * does not care whether the file exists, so this works for files that are
 * about to be reported as missing.
 *
 * On any expansion or conversion failure the original path is returned.
 */
pub fn get_absolute_path(path: &str) -> String {
    // Replace ~ and environment variable values if possible.
    let s = match shellexpand::full(path) {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };

    // Convert to absolute path if necessary.
    let p = Path::new(s.deref());
    let p1 = match p.absolutize() {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };
    let p2 = match p1.to_str() {
        Some(x) => x,
        None => return path.to_owned(),
    };

    p2.to_owned()
}

// ***************************************************************************
//                                  Traits
// ***************************************************************************
pub trait RequestDebug {
    type Req;
    fn get_request_info(&self) -> String;
}

// ---------------------------------------------------------------------------
// debug_request:
// ---------------------------------------------------------------------------
/** Write one debug record describing an incoming request: method, URI,
 * headers and whatever the parsed request body reports about itself.
 * Nothing is formatted unless debug logging is enabled.
 */
pub fn debug_request(http_req: &Request, req: &impl RequestDebug) {
    if log::max_level() < LevelFilter::Debug {
        return;
    }
    debug!("{}", format_request(http_req, req));
}

fn format_request(http_req: &Request, req: &impl RequestDebug) -> String {
    let headers: String = http_req.headers().iter()
        .map(|(name, value)| format!("  Header: {} = {:?}\n", name, value))
        .collect();
    format!("\n  {} {}\n{}{}", http_req.method(), http_req.uri(), headers, req.get_request_info())
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::{format_request, get_absolute_path, RequestDebug};
    use poem::{http::Method, Request};
    use std::path::Path;

    struct Body;
    impl RequestDebug for Body {
        type Req = Body;
        fn get_request_info(&self) -> String {
            "  Request body: empty".to_string()
        }
    }

    #[test]
    fn request_record_lists_parts() {
        let req = Request::builder()
            .method(Method::POST)
            .uri_str("/get_answer")
            .header("content-type", "application/json")
            .finish();
        let s = format_request(&req, &Body);
        assert!(s.contains("POST /get_answer"));
        assert!(s.contains("Header: content-type = \"application/json\""));
        assert!(s.ends_with("Request body: empty"));
    }

    #[test]
    fn relative_path_made_absolute() {
        let p = get_absolute_path("config/responses.json");
        assert!(Path::new(&p).is_absolute());
        assert!(p.ends_with("config/responses.json"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(get_absolute_path("/etc/oracle/responses.json"), "/etc/oracle/responses.json");
    }

    #[test]
    fn tilde_expanded() {
        let p = get_absolute_path("~/.pixel_oracle");
        assert!(!p.starts_with('~'));
        assert!(p.ends_with("/.pixel_oracle"));
    }
}
