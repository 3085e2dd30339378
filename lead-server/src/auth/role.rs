//! Staff Roles
//!
//! 固定角色集合，无层级关系。所有角色相关判断集中在 [`crate::auth::policy`]，
//! 其他模块不得自行分支角色逻辑。

use serde::{Deserialize, Serialize};

/// 员工角色
///
/// | 角色 | 作用域 |
/// |------|--------|
/// | admin | 所有 lead |
/// | account_manager | `account_manager` 归属字段等于本人姓名的 lead |
/// | field_rep | `field_rep` 归属字段等于本人姓名的 lead |
/// | installer | `installer` 归属字段等于本人姓名的 lead |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    AccountManager,
    FieldRep,
    Installer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::AccountManager => "account_manager",
            Role::FieldRep => "field_rep",
            Role::Installer => "installer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
