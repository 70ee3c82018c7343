use actix_web::{http::StatusCode, test, web::ServiceConfig, App};
use chrono::Utc;
use cpg_common::Paise;
use registration_engine::{
    db_types::{Candidate, CandidateCategory, NewCandidate, OrderId},
    helpers::normalize_phone,
    test_utils::MemoryCandidateStore,
    traits::CandidateStore,
    TemplateCatalog,
};

pub fn catalog() -> TemplateCatalog {
    TemplateCatalog {
        student_registration: "tpl-student".to_string(),
        working_registration: "tpl-working".to_string(),
        attendance_confirmed: "tpl-attendance".to_string(),
        accepted: "tpl-accepted".to_string(),
        rejected: "tpl-rejected".to_string(),
    }
}

pub async fn seed_candidate(db: &MemoryCandidateStore, order: &str, phone: &str) -> Candidate {
    db.insert_candidate(NewCandidate {
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: normalize_phone(phone).unwrap(),
        category: CandidateCategory::Student,
        college: Some("Gitam".to_string()),
        company: None,
        order_id: OrderId(order.to_string()),
        receipt: format!("receipt_{order}"),
        amount: Paise::from(50_000),
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

pub async fn post_request<F>(
    uri: &str,
    body: String,
    headers: &[(&str, String)],
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
{
    let app = test::init_service(App::new().configure(configure)).await;
    let mut req = test::TestRequest::post()
        .uri(uri)
        .insert_header(("content-type", "application/json"))
        .set_payload(body);
    for (name, value) in headers {
        req = req.insert_header((*name, value.clone()));
    }
    // A middleware may reject the request by returning an `Err` (e.g. the HMAC guard). In a running server actix
    // turns that into the corresponding HTTP response; `call_service` would instead panic, so mirror the server's
    // error-to-response conversion here.
    match test::try_call_service(&app, req.to_request()).await {
        Ok(response) => {
            let status = response.status();
            let body = test::read_body(response).await;
            (status, String::from_utf8_lossy(&body).to_string())
        },
        Err(err) => {
            let response = err.error_response();
            let status = response.status();
            let body = actix_web::body::to_bytes(response.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).to_string())
        },
    }
}
