//! Visibility Policy
//!
//! 角色作用域与字段级写权限的唯一定义点。
//!
//! ## 设计原则
//! - 作用域谓词在这里构造一次，查询/聚合/变更路径一律作为必选输入消费，
//!   禁止在各自模块内重新推导角色逻辑
//! - "field rep 只看自己的 lead" 和 "account manager 只看自己团队的 lead"
//!   是同一个模式：按归属字段精确匹配，参数化为 [`AttributionField`]
//! - 字段级写权限按 (角色, 字段) 查表，命中任一拒绝字段则整个写入失败
//! - 缺失身份时 fail closed（[`LeadScope::Nothing`]）

use crate::auth::{CurrentUser, Role};
use crate::db::models::{Lead, LeadField};

/// Lead 上的归属字段，既是业务元数据又是作用域键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionField {
    AccountManager,
    FieldRep,
    Installer,
}

impl AttributionField {
    /// 数据库列名
    pub fn column(&self) -> &'static str {
        match self {
            AttributionField::AccountManager => "account_manager",
            AttributionField::FieldRep => "field_rep",
            AttributionField::Installer => "installer",
        }
    }

    fn value_of<'a>(&self, lead: &'a Lead) -> Option<&'a str> {
        match self {
            AttributionField::AccountManager => lead.account_manager.as_deref(),
            AttributionField::FieldRep => lead.field_rep.as_deref(),
            AttributionField::Installer => lead.installer.as_deref(),
        }
    }
}

/// 作用域谓词："这条 lead 对该身份是否可见"
///
/// 每个读写路径都必须以此为基础过滤条件；调用方提供的过滤器
/// 只能在其上收窄，永远不能放宽。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadScope {
    /// 无限制 (admin)
    All,
    /// 归属字段与显示名精确匹配 (区分大小写，无模糊匹配)
    Attribution {
        field: AttributionField,
        name: String,
    },
    /// 拒绝一切 (身份缺失或显示名为空时 fail closed)
    Nothing,
}

impl LeadScope {
    /// 由身份构造作用域谓词
    pub fn for_user(user: &CurrentUser) -> Self {
        if user.role == Role::Admin {
            return LeadScope::All;
        }

        let name = user.scope_name().trim();
        if name.is_empty() {
            // 没有可匹配的显示名就什么都看不到
            return LeadScope::Nothing;
        }

        let field = match user.role {
            Role::Admin => unreachable!(),
            Role::AccountManager => AttributionField::AccountManager,
            Role::FieldRep => AttributionField::FieldRep,
            Role::Installer => AttributionField::Installer,
        };

        LeadScope::Attribution {
            field,
            name: name.to_string(),
        }
    }

    /// 内存谓词：变更路径 re-fetch 后的二次校验用
    pub fn matches(&self, lead: &Lead) -> bool {
        match self {
            LeadScope::All => true,
            LeadScope::Attribution { field, name } => field.value_of(lead) == Some(name.as_str()),
            LeadScope::Nothing => false,
        }
    }

    /// SQL 谓词：返回 WHERE 片段与绑定值
    ///
    /// 归属匹配使用 `$scope_name` 绑定，调用方不得复用该绑定名。
    pub fn sql_condition(&self) -> (&'static str, Option<(&'static str, String)>) {
        match self {
            LeadScope::All => ("true", None),
            LeadScope::Attribution { field, name } => {
                let clause = match field {
                    AttributionField::AccountManager => "account_manager = $scope_name",
                    AttributionField::FieldRep => "field_rep = $scope_name",
                    AttributionField::Installer => "installer = $scope_name",
                };
                (clause, Some(("scope_name", name.clone())))
            }
            LeadScope::Nothing => ("false", None),
        }
    }

    /// 缓存键片段：同一作用域的聚合结果可以共享缓存条目
    pub fn cache_key(&self) -> String {
        match self {
            LeadScope::All => "all".to_string(),
            LeadScope::Attribution { field, name } => format!("{}={}", field.column(), name),
            LeadScope::Nothing => "nothing".to_string(),
        }
    }
}

// ── Field-level write matrix ────────────────────────────────────────

/// 角色能否写某个 lead 字段
///
/// 读作用域必须在此之前已经通过；本函数只回答字段级问题。
pub fn can_write_field(role: Role, field: LeadField) -> bool {
    match role {
        Role::Admin => true,
        Role::AccountManager => !matches!(
            field,
            LeadField::LeadCost
                | LeadField::LeadRevenue
                | LeadField::CommissionAmount
                | LeadField::CommissionPaid
        ),
        Role::FieldRep => matches!(field, LeadField::Notes | LeadField::InstallerNotes),
        Role::Installer => matches!(field, LeadField::InstallerNotes),
    }
}

/// 列出写请求中被该角色拒绝的字段 (为空表示整个请求可接受)
pub fn denied_fields(role: Role, fields: &[LeadField]) -> Vec<LeadField> {
    fields
        .iter()
        .copied()
        .filter(|f| !can_write_field(role, *f))
        .collect()
}

// ── Role gates ──────────────────────────────────────────────────────

/// 创建 lead 的角色门禁
pub fn can_create_leads(role: Role) -> bool {
    matches!(role, Role::Admin | Role::AccountManager)
}

/// 删除 lead 的角色门禁 (作用域另行校验)
pub fn can_delete_leads(role: Role) -> bool {
    matches!(role, Role::Admin | Role::AccountManager)
}

/// dashboard / 团队绩效 / 趋势接口的角色门禁
///
/// Installer 不进任何聚合视图。
pub fn can_view_dashboards(role: Role) -> bool {
    !matches!(role, Role::Installer)
}

// ── Response shaping ────────────────────────────────────────────────

/// 响应中是否包含 online/field 成本拆分
///
/// 聚合器总是完整计算；对 account manager 仅在响应边界隐藏拆分字段。
pub fn shows_cost_split(role: Role) -> bool {
    !matches!(role, Role::AccountManager)
}
