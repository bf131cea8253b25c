pub mod cookies;
pub mod guard;
pub mod response;

pub use cookies::CurrentSession;
pub use guard::{require_admin, require_business};
pub use response::{ApiResponse, ApiResult};
