//! 界面模块

pub mod app;
pub mod dialogs;
pub mod loan_panel;
pub mod person_panel;
pub mod person_picker;
pub mod styles;
