mod device;
mod payment;
mod plan;
mod session;
mod subscription;
mod user;

pub use device::*;
pub use payment::*;
pub use plan::*;
pub use session::*;
pub use subscription::*;
pub use user::*;
