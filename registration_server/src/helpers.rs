use actix_web::HttpRequest;

/// Header carrying the acting operator's identity for audit fields. Operator-facing endpoints are expected to
/// sit behind a reverse proxy that authenticates and injects this header.
pub const OPERATOR_HEADER: &str = "x-operator-id";

const ANONYMOUS_OPERATOR: &str = "operator";

/// The explicit caller identity threaded through every mutating operator action.
pub fn operator_identity(req: &HttpRequest) -> String {
    req.headers()
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_OPERATOR)
        .to_string()
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn header_identity_is_used_when_present() {
        let req = TestRequest::default().insert_header((OPERATOR_HEADER, "asha@desk")).to_http_request();
        assert_eq!(operator_identity(&req), "asha@desk");
    }

    #[test]
    fn missing_or_blank_headers_fall_back() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(operator_identity(&req), "operator");
        let req = TestRequest::default().insert_header((OPERATOR_HEADER, "   ")).to_http_request();
        assert_eq!(operator_identity(&req), "operator");
    }
}
