//! 信令核心领域模型
//!
//! 包含消息、通知、通话记录等核心实体，房间标识的推导规则，
//! 以及持久化与外部查询的接口定义。

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod rooms;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use rooms::*;
pub use value_objects::*;
