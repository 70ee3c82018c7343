//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the engine traits so that endpoint tests can swap in scripted collaborators; actix
//! cannot register generic handlers directly, so the `route!` macro manufactures a concrete `HttpServiceFactory`
//! per handler.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::{debug, trace, warn};
use registration_engine::{
    db_types::{AttendanceToken, Candidate, PaymentId, PaymentStatus},
    traits::{ArtifactStore, CandidateStore, CertificateRenderer, NotificationChannel, PaymentGatewayClient},
    AttendanceApi,
    CaptureOutcome,
    CertificateApi,
    CheckInStatus,
    PaymentReconciler,
    RegistrationApi,
    ScanResult,
};
use serde_json::json;

use crate::{
    data_objects::{
        AttendanceRequest,
        CandidateIdRequest,
        CandidateQuery,
        CertificateSendRequest,
        PaymentCallback,
        RegistrationRequest,
        ScanRequest,
    },
    errors::ServerError,
    helpers::operator_identity,
    signature::CallbackVerifier,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Registration  ----------------------------------------------------
route!(register => Post "/order" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
/// Registration intake: creates the gateway order for the fee and the Pending candidate bound to it. The
/// response carries the order the checkout front end needs to open the payment flow.
pub async fn register<B, G, N>(
    body: web::Json<RegistrationRequest>,
    api: web::Data<RegistrationApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let request = body.into_inner();
    debug!("💻️ Registration request for {}", request.form_data.name);
    let (candidate, order) = api.register(request.into_registration()).await?;
    Ok(HttpResponse::Ok().json(json!({ "order": order, "candidateId": candidate.id })))
}

route!(verify_payment => Post "/verify" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
/// The client-side verification callback. The gateway signs `order|payment` with the API key secret; a bad
/// signature is rejected before anything touches the store. A valid callback funnels into the same conditional
/// capture transition the webhook and the sweep use.
pub async fn verify_payment<B, G, N>(
    body: web::Json<PaymentCallback>,
    verifier: web::Data<CallbackVerifier>,
    api: web::Data<PaymentReconciler<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let callback = body.into_inner();
    trace!("💻️ Payment verification callback for order {}", callback.razorpay_order_id);
    if let Err(e) =
        verifier.verify(&callback.razorpay_order_id, &callback.razorpay_payment_id, &callback.razorpay_signature)
    {
        warn!(
            "💻️ Signature verification failed for payment callback on order {}. The request is rejected.",
            callback.razorpay_order_id
        );
        return Err(ServerError::SignatureError(e));
    }
    let order_id = callback.razorpay_order_id.into();
    let payment_id = PaymentId(callback.razorpay_payment_id);
    let outcome = api.process_client_callback(&order_id, &payment_id).await?;
    let response = match outcome {
        CaptureOutcome::Transitioned { candidate, .. } => json!({ "message": "success", "candidate": candidate }),
        CaptureOutcome::AlreadyPaid(candidate) => {
            json!({ "message": "Already Registered", "candidate": candidate })
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Reconciliation  --------------------------------------------------
route!(reconcile => Post "/reconcile" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
/// Run a reconciliation sweep on demand and return the structured summary.
pub async fn reconcile<B, G, N>(api: web::Data<PaymentReconciler<B, G, N>>) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    debug!("💻️ POST reconcile");
    let summary = api.reconcile_pending().await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(check_candidate => Post "/candidates/{id}/check" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
/// Replay the sweep resolution for a single candidate.
pub async fn check_candidate<B, G, N>(
    path: web::Path<i64>,
    api: web::Data<PaymentReconciler<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let id = path.into_inner();
    debug!("💻️ POST check payment for candidate #{id}");
    let record = api.check_candidate(id).await?;
    Ok(HttpResponse::Ok().json(record))
}

route!(payment_lookup => Get "/payments/{payment_id}" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
/// Look up the candidate holding a payment id. A still-Pending record is opportunistically re-checked against
/// gateway truth before answering, so a stale record does not mislead the caller.
pub async fn payment_lookup<B, G, N>(
    path: web::Path<String>,
    registrations: web::Data<RegistrationApi<B, G, N>>,
    reconciler: web::Data<PaymentReconciler<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let payment_id = PaymentId(path.into_inner());
    debug!("💻️ GET payment_lookup({payment_id})");
    let candidate = registrations
        .fetch_by_payment_id(&payment_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No candidate holds payment {payment_id}")))?;
    let candidate = if candidate.payment_status == PaymentStatus::Pending {
        reconciler.check_candidate(candidate.id).await?;
        registrations.fetch(candidate.id).await?
    } else {
        candidate
    };
    Ok(HttpResponse::Ok().json(candidate))
}

//----------------------------------------------   Candidates  ------------------------------------------------------
route!(candidates => Get "/candidates" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
pub async fn candidates<B, G, N>(
    query: web::Query<CandidateQuery>,
    api: web::Data<RegistrationApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    debug!("💻️ GET candidates");
    let list = api.list(query.payment_status).await?;
    Ok(HttpResponse::Ok().json(json!({ "total": list.len(), "candidates": list })))
}

route!(candidate_by_id => Get "/candidates/{id}" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
pub async fn candidate_by_id<B, G, N>(
    path: web::Path<i64>,
    api: web::Data<RegistrationApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let id = path.into_inner();
    debug!("💻️ GET candidate #{id}");
    let candidate = api.fetch(id).await?;
    Ok(HttpResponse::Ok().json(candidate))
}

route!(accept_candidate => Post "/candidates/{id}/accept" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
pub async fn accept_candidate<B, G, N>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<RegistrationApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let id = path.into_inner();
    let actor = operator_identity(&req);
    let (candidate, _) = api.accept(id, &actor).await?;
    Ok(HttpResponse::Ok().json(candidate))
}

route!(reject_candidate => Post "/candidates/{id}/reject" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
pub async fn reject_candidate<B, G, N>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<RegistrationApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let id = path.into_inner();
    let actor = operator_identity(&req);
    let (candidate, _) = api.reject(id, &actor).await?;
    Ok(HttpResponse::Ok().json(candidate))
}

route!(refund_candidate => Post "/candidates/{id}/refund" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
pub async fn refund_candidate<B, G, N>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<RegistrationApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    let id = path.into_inner();
    let actor = operator_identity(&req);
    let (candidate, refund) = api.refund(id, &actor).await?;
    Ok(HttpResponse::Ok().json(json!({ "candidate": candidate, "refund": refund })))
}

//----------------------------------------------   Attendance  ------------------------------------------------------
route!(check_in => Post "/check-in" impl CandidateStore, NotificationChannel);
/// Self check-in by WhatsApp number. Idempotent: a re-scan returns "already marked" without re-notifying.
pub async fn check_in<B, N>(
    body: web::Json<AttendanceRequest>,
    api: web::Data<AttendanceApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
{
    let request = body.into_inner();
    let check_in = api.check_in(&request.whatsapp_number).await?;
    let message = match check_in.status {
        CheckInStatus::Marked => "Attendance marked successfully",
        CheckInStatus::AlreadyMarked => "Attendance already taken",
    };
    Ok(HttpResponse::Ok().json(json!({
        "status": check_in.status,
        "message": message,
        "attendanceToken": check_in.token,
        "candidate": candidate_summary(&check_in.candidate),
    })))
}

route!(attendance_scan => Post "/scan" impl CandidateStore, NotificationChannel);
/// Staff verification scan, keyed by the attendance token.
pub async fn attendance_scan<B, N>(
    body: web::Json<ScanRequest>,
    api: web::Data<AttendanceApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
{
    let token = AttendanceToken(body.into_inner().token);
    let response = match api.verify_scan(&token).await? {
        ScanResult::Verified(c) => {
            json!({ "status": "success", "message": "Attendance verified", "candidate": candidate_summary(&c) })
        },
        ScanResult::AlreadyVerified(c) => json!({
            "status": "already-marked",
            "message": "Staff already verified this candidate",
            "candidate": candidate_summary(&c),
        }),
    };
    Ok(HttpResponse::Ok().json(response))
}

fn candidate_summary(candidate: &Candidate) -> serde_json::Value {
    json!({
        "id": candidate.id,
        "name": candidate.name,
        "email": candidate.email,
        "phone": candidate.phone,
        "category": candidate.category,
        "college": candidate.college,
    })
}

//----------------------------------------------   Certificates  ----------------------------------------------------
route!(certificate_eligibility => Get "/certificates/eligible" impl CandidateStore, NotificationChannel, CertificateRenderer, ArtifactStore);
pub async fn certificate_eligibility<B, N, R, S>(
    api: web::Data<CertificateApi<B, N, R, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
    R: CertificateRenderer,
    S: ArtifactStore,
{
    debug!("💻️ GET certificate eligibility");
    let report = api.eligible().await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(certificate_statistics => Get "/certificates/statistics" impl CandidateStore, NotificationChannel, CertificateRenderer, ArtifactStore);
pub async fn certificate_statistics<B, N, R, S>(
    api: web::Data<CertificateApi<B, N, R, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
    R: CertificateRenderer,
    S: ArtifactStore,
{
    debug!("💻️ GET certificate statistics");
    let stats = api.statistics().await?;
    Ok(HttpResponse::Ok().json(stats))
}

route!(send_certificates => Post "/certificates/send" impl CandidateStore, NotificationChannel, CertificateRenderer, ArtifactStore);
/// Run the issuance batch over the selected candidates (explicit id list, or all eligible). Returns the
/// structured batch summary.
pub async fn send_certificates<B, N, R, S>(
    req: HttpRequest,
    body: web::Json<CertificateSendRequest>,
    api: web::Data<CertificateApi<B, N, R, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
    R: CertificateRenderer,
    S: ArtifactStore,
{
    let actor = operator_identity(&req);
    let ids = body.into_inner().candidate_ids;
    debug!("💻️ POST certificate batch by {actor}");
    let summary = api.issue_batch(ids, &actor).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(send_certificate => Post "/certificates/send-one" impl CandidateStore, NotificationChannel, CertificateRenderer, ArtifactStore);
pub async fn send_certificate<B, N, R, S>(
    req: HttpRequest,
    body: web::Json<CandidateIdRequest>,
    api: web::Data<CertificateApi<B, N, R, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
    R: CertificateRenderer,
    S: ArtifactStore,
{
    let actor = operator_identity(&req);
    let id = body.into_inner().candidate_id;
    debug!("💻️ POST single certificate for candidate #{id} by {actor}");
    let result = api.issue_single(id, &actor).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(resend_certificate => Post "/certificates/resend" impl CandidateStore, NotificationChannel, CertificateRenderer, ArtifactStore);
pub async fn resend_certificate<B, N, R, S>(
    req: HttpRequest,
    body: web::Json<CandidateIdRequest>,
    api: web::Data<CertificateApi<B, N, R, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: CandidateStore,
    N: NotificationChannel,
    R: CertificateRenderer,
    S: ArtifactStore,
{
    let actor = operator_identity(&req);
    let id = body.into_inner().candidate_id;
    debug!("💻️ POST certificate resend for candidate #{id} by {actor}");
    let result = api.resend(id, &actor).await?;
    Ok(HttpResponse::Ok().json(result))
}
