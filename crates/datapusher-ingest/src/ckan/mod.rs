//! CKAN catalog and datastore access

pub mod client;
pub mod endpoints;
pub mod response;
pub mod types;

pub use client::{datastore_alias, CkanClient};
pub use response::{check_response, check_status, ResponseCheck};
