//! 表单校验
//!
//! 把界面上的原始输入转换为可以直接写入数据库的记录。
//! 校验失败时不写入任何数据。

use crate::core::models::{GuarantorLayout, NewLoan, NewPerson, Score};
use chrono::NaiveDate;
use thiserror::Error;

/// 校验错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("姓名和身份证号为必填项")]
    MissingRequired,
    #[error("请选择借款人")]
    MissingBorrower,
    #[error("金额 \"{0}\" 不是有效数字")]
    InvalidAmount(String),
    #[error("金额必须大于0")]
    NonPositiveAmount,
    #[error("利率 \"{0}\" 不是有效数字")]
    InvalidPercentage(String),
    #[error("利率不能为负数")]
    NegativePercentage,
    #[error("借款人不能同时作为担保人")]
    BorrowerIsGuarantor,
    #[error("最多只能选择 {max} 名担保人")]
    TooManyGuarantors { max: usize },
}

/// 人员表单原始输入
#[derive(Debug, Clone, Default)]
pub struct PersonForm {
    pub name: String,
    pub ssn: String,
    pub job: String,
    pub score: Score,
    /// 编辑旧记录时保留的非等级评级，选择等级后清空
    pub stored_score: Option<String>,
}

impl PersonForm {
    /// 清空表单
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 借款表单原始输入
#[derive(Debug, Clone)]
pub struct LoanForm {
    pub borrower_id: Option<i64>,
    pub guarantor_ids: Vec<i64>,
    pub amount: String,
    pub percentage: String,
    pub description: String,
    pub date: NaiveDate,
}

impl LoanForm {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            borrower_id: None,
            guarantor_ids: Vec::new(),
            amount: String::new(),
            percentage: String::new(),
            description: String::new(),
            date,
        }
    }
}

/// 校验人员表单
pub fn validate_person(form: &PersonForm) -> Result<NewPerson, ValidationError> {
    let name = form.name.trim();
    let ssn = form.ssn.trim();
    if name.is_empty() || ssn.is_empty() {
        return Err(ValidationError::MissingRequired);
    }

    let job = form.job.trim();
    Ok(NewPerson {
        name: name.to_string(),
        ssn: ssn.to_string(),
        job: (!job.is_empty()).then(|| job.to_string()),
        score: form.stored_score.is_none().then_some(form.score),
    })
}

/// 校验借款表单
pub fn validate_loan(form: &LoanForm, layout: GuarantorLayout) -> Result<NewLoan, ValidationError> {
    let borrower_id = form.borrower_id.ok_or(ValidationError::MissingBorrower)?;

    let amount = parse_number(&form.amount)
        .ok_or_else(|| ValidationError::InvalidAmount(form.amount.trim().to_string()))?;
    if amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount);
    }

    let percentage = if form.percentage.trim().is_empty() {
        None
    } else {
        let value = parse_number(&form.percentage)
            .ok_or_else(|| ValidationError::InvalidPercentage(form.percentage.trim().to_string()))?;
        if value < 0.0 {
            return Err(ValidationError::NegativePercentage);
        }
        Some(value)
    };

    let mut guarantor_ids: Vec<i64> = Vec::with_capacity(form.guarantor_ids.len());
    for id in &form.guarantor_ids {
        if !guarantor_ids.contains(id) {
            guarantor_ids.push(*id);
        }
    }
    if guarantor_ids.contains(&borrower_id) {
        return Err(ValidationError::BorrowerIsGuarantor);
    }
    if let Some(max) = layout.max_guarantors() {
        if guarantor_ids.len() > max {
            return Err(ValidationError::TooManyGuarantors { max });
        }
    }

    Ok(NewLoan {
        borrower_id,
        guarantor_ids,
        amount,
        percentage,
        description: form.description.trim().to_string(),
        date: form.date,
    })
}

/// 解析数字输入
///
/// 接受波斯数字和阿拉伯-印度数字、阿拉伯小数点以及千位分隔符。
/// 千位分隔符只能出现在整数部分的三位一组之间。
/// 非有限值（NaN、inf）视为无效。
pub fn parse_number(input: &str) -> Option<f64> {
    let normalized = normalize_digits(input);
    if normalized.is_empty() {
        return None;
    }
    let plain = strip_group_separators(&normalized)?;
    plain.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_digits(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{200c}'))
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            '٫' => '.',
            '٬' => ',',
            other => other,
        })
        .collect()
}

/// 去掉千位分隔符，位置不合法时返回 None
fn strip_group_separators(text: &str) -> Option<String> {
    if !text.contains(',') {
        return Some(text.to_string());
    }

    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let digits = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    let mut groups = digits.split(',');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 || !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    Some(text.replace(',', ""))
}
