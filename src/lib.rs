// Library exports for commonplace

pub mod config;
pub mod logging;
pub mod richtext;
pub mod session;
pub mod store;
pub mod zettel;
