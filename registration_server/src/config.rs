use std::{env, time::Duration};

use cpg_common::{parse_boolean_flag, Secret};
use log::{error, info, warn};
use razorpay_tools::RazorpayConfig;
use registration_engine::{SweepRetry, TemplateCatalog};

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8360;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_SWEEP_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_CERTIFICATE_PACING_MS: u64 = 3000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub razorpay: RazorpayConfig,
    /// If false, webhook deliveries are accepted without raw-body HMAC verification. **DANGER**
    pub webhook_signature_checks: bool,
    pub gupshup: GupshupConfig,
    pub cloudinary: CloudinaryConfig,
    pub templates: TemplateCatalog,
    /// Period of the background reconciliation sweep. Zero disables the worker.
    pub sweep_interval: Duration,
    pub sweep_retry: SweepRetry,
    /// Pause between consecutive certificate issuances in a batch.
    pub certificate_pacing: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: String::default(),
            razorpay: RazorpayConfig::default(),
            webhook_signature_checks: true,
            gupshup: GupshupConfig::default(),
            cloudinary: CloudinaryConfig::default(),
            templates: TemplateCatalog::default(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            sweep_retry: SweepRetry::default(),
            certificate_pacing: Duration::from_millis(DEFAULT_CERTIFICATE_PACING_MS),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPG_HOST").ok().unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = env::var("CPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPG_PORT. {e} Using the default, {DEFAULT_CPG_PORT}, instead."
                    );
                    DEFAULT_CPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPG_PORT);
        let database_url = env::var("CPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_DATABASE_URL is not set. Please set it to the URL for the candidate database.");
            String::default()
        });
        let razorpay = RazorpayConfig::new_from_env_or_default();
        let webhook_signature_checks = parse_boolean_flag(env::var("CPG_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Do not run like this in production.");
        }
        let sweep_interval = duration_from_env("CPG_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS, Duration::from_secs);
        let sweep_retry = SweepRetry {
            delay: duration_from_env("CPG_SWEEP_RETRY_DELAY_MS", DEFAULT_SWEEP_RETRY_DELAY_MS, Duration::from_millis),
        };
        let certificate_pacing =
            duration_from_env("CPG_CERTIFICATE_PACING_MS", DEFAULT_CERTIFICATE_PACING_MS, Duration::from_millis);
        Self {
            host,
            port,
            database_url,
            razorpay,
            webhook_signature_checks,
            gupshup: GupshupConfig::from_env_or_default(),
            cloudinary: CloudinaryConfig::from_env_or_default(),
            templates: template_catalog_from_env(),
            sweep_interval,
            sweep_retry,
            certificate_pacing,
        }
    }
}

fn duration_from_env(name: &str, default: u64, make: fn(u64) -> Duration) -> Duration {
    let value = env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {default}."))
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}"))
        })
        .ok()
        .unwrap_or(default);
    make(value)
}

fn template_catalog_from_env() -> TemplateCatalog {
    let fetch = |name: &str| {
        env::var(name).ok().unwrap_or_else(|| {
            error!("🪛️ {name} is not set. The corresponding notification cannot be delivered without it.");
            String::default()
        })
    };
    TemplateCatalog {
        student_registration: fetch("CPG_TEMPLATE_STUDENT_REGISTRATION"),
        working_registration: fetch("CPG_TEMPLATE_WORKING_REGISTRATION"),
        attendance_confirmed: fetch("CPG_TEMPLATE_ATTENDANCE"),
        accepted: fetch("CPG_TEMPLATE_ACCEPTED"),
        rejected: fetch("CPG_TEMPLATE_REJECTED"),
    }
}

//-------------------------------------------------  GupshupConfig  ---------------------------------------------------
const DEFAULT_GUPSHUP_API_URL: &str = "https://api.gupshup.io/wa/api/v1";

#[derive(Clone, Debug)]
pub struct GupshupConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    /// The WhatsApp number messages are sent from.
    pub source: String,
    pub app_name: String,
    pub timeout: Duration,
}

impl Default for GupshupConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GUPSHUP_API_URL.to_string(),
            api_key: Secret::default(),
            source: String::default(),
            app_name: String::default(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl GupshupConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("CPG_GUPSHUP_API_URL").ok().unwrap_or_else(|| DEFAULT_GUPSHUP_API_URL.to_string());
        let api_key = env::var("CPG_GUPSHUP_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_GUPSHUP_API_KEY is not set. Notifications will fail.");
            String::default()
        });
        let source = env::var("CPG_GUPSHUP_SOURCE").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_GUPSHUP_SOURCE is not set. Please set it to the WhatsApp source number.");
            String::default()
        });
        let app_name = env::var("CPG_GUPSHUP_APP_NAME").ok().unwrap_or_default();
        let timeout = duration_from_env("CPG_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS, Duration::from_secs);
        Self { api_url, api_key: Secret::new(api_key), source, app_name, timeout }
    }
}

//-------------------------------------------------  CloudinaryConfig  ------------------------------------------------
const DEFAULT_CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";
const DEFAULT_CLOUDINARY_FOLDER: &str = "certificates";

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub api_url: String,
    pub cloud_name: String,
    /// Unsigned upload preset. Uploads are preset-scoped rather than request-signed.
    pub upload_preset: String,
    pub folder: String,
    pub timeout: Duration,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_CLOUDINARY_API_URL.to_string(),
            cloud_name: String::default(),
            upload_preset: String::default(),
            folder: DEFAULT_CLOUDINARY_FOLDER.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl CloudinaryConfig {
    pub fn from_env_or_default() -> Self {
        let api_url =
            env::var("CPG_CLOUDINARY_API_URL").ok().unwrap_or_else(|| DEFAULT_CLOUDINARY_API_URL.to_string());
        let cloud_name = env::var("CPG_CLOUDINARY_CLOUD_NAME").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_CLOUDINARY_CLOUD_NAME is not set. Certificate uploads will fail.");
            String::default()
        });
        let upload_preset = env::var("CPG_CLOUDINARY_UPLOAD_PRESET").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_CLOUDINARY_UPLOAD_PRESET is not set. Certificate uploads will fail.");
            String::default()
        });
        let folder =
            env::var("CPG_CLOUDINARY_FOLDER").ok().unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_string());
        let timeout = duration_from_env("CPG_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS, Duration::from_secs);
        Self { api_url, cloud_name, upload_preset, folder, timeout }
    }
}
