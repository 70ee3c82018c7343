use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use actix_web::dev::Server;
use razorpay_tools::{data_objects::WEBHOOK_SIGNATURE_HEADER, RazorpayApi};
use registration_engine::{
    AttendanceApi,
    CertificateApi,
    CertificatePipelineOptions,
    NotificationDispatcher,
    PaymentReconciler,
    RegistrationApi,
    SqliteCandidateStore,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{CloudinaryStore, GupshupChannel, HtmlCertificateRenderer, RazorpayGateway},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        AcceptCandidateRoute,
        AttendanceScanRoute,
        CandidateByIdRoute,
        CandidatesRoute,
        CertificateEligibilityRoute,
        CertificateStatisticsRoute,
        CheckCandidateRoute,
        CheckInRoute,
        PaymentLookupRoute,
        ReconcileRoute,
        RefundCandidateRoute,
        RegisterRoute,
        RejectCandidateRoute,
        ResendCertificateRoute,
        SendCertificateRoute,
        SendCertificatesRoute,
        VerifyPaymentRoute,
    },
    signature::{CallbackVerifier, SignatureVerifier},
    sweep_worker::start_sweep_worker,
    webhook_routes::PaymentWebhookRoute,
};

// The concrete collaborator set the production server runs with.
type Store = SqliteCandidateStore;
type Gateway = RazorpayGateway;
type Notifier = GupshupChannel;
type Renderer = HtmlCertificateRenderer;
type Artifacts = CloudinaryStore;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteCandidateStore::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteCandidateStore) -> Result<Server, ServerError> {
    let gateway = RazorpayGateway::new(
        RazorpayApi::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?,
    );
    let channel =
        GupshupChannel::new(config.gupshup.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let renderer = HtmlCertificateRenderer::new().map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let artifacts =
        CloudinaryStore::new(config.cloudinary.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let callback_verifier = CallbackVerifier::new(config.razorpay.key_secret.clone());
    let webhook_verifier = SignatureVerifier::new(config.razorpay.webhook_secret.clone());

    if !config.sweep_interval.is_zero() {
        start_sweep_worker(
            db.clone(),
            gateway.clone(),
            channel.clone(),
            config.templates.clone(),
            config.sweep_retry,
            config.sweep_interval,
        );
    }

    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let dispatcher = NotificationDispatcher::new(channel.clone(), config.templates.clone());
        let reconciler = PaymentReconciler::new(db.clone(), gateway.clone(), dispatcher.clone())
            .with_sweep_retry(config.sweep_retry);
        let registrations = RegistrationApi::new(db.clone(), gateway.clone(), dispatcher.clone());
        let attendance = AttendanceApi::new(db.clone(), dispatcher.clone());
        let certificates = CertificateApi::new(db.clone(), dispatcher, renderer.clone(), artifacts.clone())
            .with_options(CertificatePipelineOptions { pacing: config.certificate_pacing });
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log"))
            .app_data(web::Data::new(reconciler))
            .app_data(web::Data::new(registrations))
            .app_data(web::Data::new(attendance))
            .app_data(web::Data::new(certificates))
            .app_data(web::Data::new(callback_verifier.clone()));
        let register_scope = web::scope("/register")
            .service(RegisterRoute::<Store, Gateway, Notifier>::new())
            .service(VerifyPaymentRoute::<Store, Gateway, Notifier>::new());
        let attendance_scope = web::scope("/attendance")
            .service(CheckInRoute::<Store, Notifier>::new())
            .service(AttendanceScanRoute::<Store, Notifier>::new());
        let api_scope = web::scope("/api")
            .service(ReconcileRoute::<Store, Gateway, Notifier>::new())
            .service(CandidatesRoute::<Store, Gateway, Notifier>::new())
            .service(CandidateByIdRoute::<Store, Gateway, Notifier>::new())
            .service(CheckCandidateRoute::<Store, Gateway, Notifier>::new())
            .service(PaymentLookupRoute::<Store, Gateway, Notifier>::new())
            .service(AcceptCandidateRoute::<Store, Gateway, Notifier>::new())
            .service(RejectCandidateRoute::<Store, Gateway, Notifier>::new())
            .service(RefundCandidateRoute::<Store, Gateway, Notifier>::new())
            .service(CertificateEligibilityRoute::<Store, Notifier, Renderer, Artifacts>::new())
            .service(CertificateStatisticsRoute::<Store, Notifier, Renderer, Artifacts>::new())
            .service(SendCertificatesRoute::<Store, Notifier, Renderer, Artifacts>::new())
            .service(SendCertificateRoute::<Store, Notifier, Renderer, Artifacts>::new())
            .service(ResendCertificateRoute::<Store, Notifier, Renderer, Artifacts>::new());
        // Webhook deliveries are verified over the raw body before any JSON parsing happens.
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                WEBHOOK_SIGNATURE_HEADER,
                webhook_verifier.clone(),
                config.webhook_signature_checks,
            ))
            .service(PaymentWebhookRoute::<Store, Gateway, Notifier>::new());
        app.service(health).service(register_scope).service(attendance_scope).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
