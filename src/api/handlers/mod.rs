pub mod analyze;
pub mod assets;
pub mod system;

pub use analyze::generate_analyze_routes;
pub use assets::generate_asset_routes;
pub use system::generate_system_routes;
