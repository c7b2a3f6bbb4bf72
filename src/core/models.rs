//! 核心数据模型定义
//!
//! 人员、借款、担保人以及担保人的三种表结构。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 人员
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// 自增ID
    pub id: i64,
    /// 姓名
    pub name: String,
    /// 身份证号（唯一）
    pub ssn: String,
    /// 职业
    pub job: Option<String>,
    /// 信用评级（旧数据可能是自由文本）
    pub score: String,
}

/// 待插入的人员记录（已通过校验）
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    pub name: String,
    pub ssn: String,
    pub job: Option<String>,
    /// 为空时新增使用默认评级，修改保留原值
    pub score: Option<Score>,
}

/// 信用评级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Score {
    #[default]
    A,
    B,
    C,
    D,
}

impl Score {
    pub const ALL: [Score; 4] = [Score::A, Score::B, Score::C, Score::D];

    /// 存入数据库的文本
    pub fn as_str(&self) -> &'static str {
        match self {
            Score::A => "A",
            Score::B => "B",
            Score::C => "C",
            Score::D => "D",
        }
    }

    /// 界面显示文本
    pub fn label(&self) -> &'static str {
        match self {
            Score::A => "A（优秀）",
            Score::B => "B（良好）",
            Score::C => "C（一般）",
            Score::D => "D（较差）",
        }
    }

    /// 从数据库文本解析，无法识别时返回 None
    pub fn parse(text: &str) -> Option<Score> {
        match text.trim().to_uppercase().as_str() {
            "A" => Some(Score::A),
            "B" => Some(Score::B),
            "C" => Some(Score::C),
            "D" => Some(Score::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 待插入的借款记录（已通过校验）
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    /// 借款人ID
    pub borrower_id: i64,
    /// 担保人ID列表（去重，保持选择顺序）
    pub guarantor_ids: Vec<i64>,
    /// 金额，必须大于0
    pub amount: f64,
    /// 利率（百分比），可选
    pub percentage: Option<f64>,
    /// 说明
    pub description: String,
    /// 日期
    pub date: NaiveDate,
}

/// 借款列表中的一行（联表查询结果，只读）
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRow {
    pub id: i64,
    pub borrower_id: i64,
    /// 借款人姓名，人员被外部删除时为空
    pub borrower_name: Option<String>,
    pub amount: f64,
    pub percentage: Option<f64>,
    pub description: String,
    /// ISO 日期文本（YYYY-MM-DD）
    pub date: String,
    /// 担保人姓名
    pub guarantor_names: Vec<String>,
}

/// 借款汇总（状态栏用）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoanTotals {
    pub count: usize,
    pub total_amount: f64,
}

/// 担保人存储方式
///
/// 三种表结构互不兼容，一个数据库文件只能使用其中一种。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GuarantorLayout {
    /// loans 表中单个可空 guarantor_id 列
    SingleColumn,
    /// loan_guarantors 关联表（多对多）
    #[default]
    JoinTable,
    /// loans 表中固定的 guarantor1_id..guarantor5_id 列
    FixedColumns,
}

/// 固定列结构的列数
pub const FIXED_GUARANTOR_COLUMNS: usize = 5;

impl GuarantorLayout {
    pub const ALL: [GuarantorLayout; 3] = [
        GuarantorLayout::SingleColumn,
        GuarantorLayout::JoinTable,
        GuarantorLayout::FixedColumns,
    ];

    /// 每笔借款允许的最多担保人数量，None 表示不限
    pub fn max_guarantors(&self) -> Option<usize> {
        match self {
            GuarantorLayout::SingleColumn => Some(1),
            GuarantorLayout::JoinTable => None,
            GuarantorLayout::FixedColumns => Some(FIXED_GUARANTOR_COLUMNS),
        }
    }

    /// 界面显示文本
    pub fn label(&self) -> &'static str {
        match self {
            GuarantorLayout::SingleColumn => "单担保人列",
            GuarantorLayout::JoinTable => "担保人关联表",
            GuarantorLayout::FixedColumns => "五个固定担保人列",
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据库文件路径，为空时使用默认数据目录
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// 新建数据库时使用的担保人结构
    #[serde(default)]
    pub guarantor_layout: GuarantorLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            guarantor_layout: GuarantorLayout::JoinTable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_parse() {
        assert_eq!(Score::parse(" b "), Some(Score::B));
        assert_eq!(Score::parse("excellent"), None);
        for score in Score::ALL {
            assert_eq!(Score::parse(score.as_str()), Some(score));
        }
    }

    #[test]
    fn test_layout_limits() {
        assert_eq!(GuarantorLayout::SingleColumn.max_guarantors(), Some(1));
        assert_eq!(GuarantorLayout::JoinTable.max_guarantors(), None);
        assert_eq!(GuarantorLayout::FixedColumns.max_guarantors(), Some(5));
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
