pub mod geo_client;
pub mod resolver;

pub use geo_client::GeoClient;
pub use resolver::{GeoResolver, Resolution, ResolveWarning, Source};
