pub mod woocommerce;

pub use woocommerce::{RelayError, StoreCredentials, UpstreamRequest, WooApi};
