pub mod error;
pub mod grant;
pub mod password;
pub mod request;
pub mod response;
pub mod scope;
pub mod session;
pub mod user;

pub use error::*;
pub use grant::*;
pub use password::*;
pub use request::*;
pub use response::*;
pub use scope::*;
pub use session::*;
pub use user::*;
