pub mod asset_source;
pub mod asset_store;
pub mod fingerprint;
