//! Core模块 - 数据模型、表单校验与搜索过滤

pub mod error;
pub mod filter;
pub mod models;
pub mod validation;
