pub mod identity;
pub mod logging;
pub mod request_id;

pub use identity::*;
pub use logging::*;
pub use request_id::*;
