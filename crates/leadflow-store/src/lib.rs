pub mod error;
pub mod leads;
pub mod sample;

pub use error::StoreError;
pub use leads::{LeadStore, TrackingUpdate};
