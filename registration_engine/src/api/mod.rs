pub mod attendance;
pub mod certificates;
pub mod errors;
pub mod objects;
pub mod reconciler;
pub mod registration;
