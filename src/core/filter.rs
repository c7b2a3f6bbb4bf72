//! 搜索过滤
//!
//! 不区分大小写的子串匹配，空查询匹配所有记录。

use crate::core::models::{LoanRow, Person};

/// 搜索查询
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// 任一字段包含查询文本即匹配
    pub fn matches_any<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.is_empty() {
            return true;
        }
        fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }

    /// 人员：按姓名、身份证号、职业匹配
    pub fn matches_person(&self, person: &Person) -> bool {
        self.matches_any([
            person.name.as_str(),
            person.ssn.as_str(),
            person.job.as_deref().unwrap_or(""),
        ])
    }

    /// 借款：按借款人、担保人、说明匹配
    pub fn matches_loan(&self, loan: &LoanRow) -> bool {
        self.matches_any(
            [
                loan.borrower_name.as_deref().unwrap_or(""),
                loan.description.as_str(),
            ]
            .into_iter()
            .chain(loan.guarantor_names.iter().map(String::as_str)),
        )
    }
}

/// 过滤人员列表，返回匹配项的下标
pub fn filter_persons(persons: &[Person], query: &SearchQuery) -> Vec<usize> {
    persons
        .iter()
        .enumerate()
        .filter(|(_, p)| query.matches_person(p))
        .map(|(i, _)| i)
        .collect()
}

/// 过滤借款列表，返回匹配项的下标
pub fn filter_loans(loans: &[LoanRow], query: &SearchQuery) -> Vec<usize> {
    loans
        .iter()
        .enumerate()
        .filter(|(_, l)| query.matches_loan(l))
        .map(|(i, _)| i)
        .collect()
}
