//! Thin adapters binding the engine's collaborator traits to the actual vendors: the Razorpay REST client, the
//! Gupshup WhatsApp channel, and the Cloudinary artifact store, plus the HTML certificate renderer that owns the
//! pipeline's scoped working directory.
mod certificates;
mod cloudinary;
mod gupshup;
mod razorpay;

pub use certificates::HtmlCertificateRenderer;
pub use cloudinary::CloudinaryStore;
pub use gupshup::GupshupChannel;
pub use razorpay::RazorpayGateway;
