//! 在线聊天室核心领域模型
//!
//! 包含用户身份、会话声明以及房间在线状态等实体，不依赖任何基础设施。

pub mod errors;
pub mod presence;
pub mod session;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use presence::*;
pub use session::*;
pub use user::*;
pub use value_objects::*;
