//! 数据层错误类型

use crate::core::validation::ValidationError;
use thiserror::Error;

/// 账本操作错误
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 表单校验失败
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 身份证号已存在
    #[error("身份证号 {0} 已存在")]
    DuplicateSsn(String),

    /// 人员不存在
    #[error("人员 #{0} 不存在")]
    PersonNotFound(i64),

    /// 借款不存在
    #[error("借款 #{0} 不存在")]
    LoanNotFound(i64),

    /// 人员仍被借款引用（作为借款人或担保人）
    #[error("人员 #{0} 仍被借款记录引用，无法删除")]
    PersonInUse(i64),

    /// 担保人数量超过当前表结构的上限
    #[error("担保人数量 {count} 超过上限 {max}")]
    TooManyGuarantors { count: usize, max: usize },

    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// 文件系统错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// 是否属于用户输入问题（以警告而非错误展示）
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_)
                | LedgerError::DuplicateSsn(_)
                | LedgerError::PersonInUse(_)
                | LedgerError::TooManyGuarantors { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
