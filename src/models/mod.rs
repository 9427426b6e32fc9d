pub mod ad_package;
pub mod creative;
pub mod request;

pub use ad_package::*;
pub use creative::*;
pub use request::*;
