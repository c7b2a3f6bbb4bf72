//! 借款管理面板
//!
//! 左侧选择借款人和担保人并填写借款表单，下方为借款列表。

use crate::core::error::Result;
use crate::core::filter::{filter_loans, SearchQuery};
use crate::core::models::{GuarantorLayout, LoanRow, Person};
use crate::core::validation::{validate_loan, LoanForm};
use crate::storage::database::Database;
use crate::ui::person_picker::{PersonPicker, PickMode};
use crate::ui::styles::format_amount;
use chrono::Local;
use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, DatePickerButton, TableBuilder};

/// 借款面板
pub struct LoanPanel {
    /// 借款人选择器
    borrower_picker: PersonPicker,
    /// 担保人选择器
    guarantor_picker: PersonPicker,
    /// 表单（借款人和担保人在提交时从选择器填入）
    form: LoanForm,
    /// 人员快照
    persons: Vec<Person>,
    /// 借款列表快照
    loans: Vec<LoanRow>,
    /// 借款列表搜索
    search: String,
    /// 列表中选中的借款
    selected_loan: Option<i64>,
    /// 选中借款的担保人详情
    selected_guarantors: Vec<Person>,
    /// 选择器提示信息
    hint: Option<String>,
}

/// 借款面板操作
#[derive(Debug, PartialEq)]
pub enum LoanPanelAction {
    None,
    Add,
    Select(i64),
    Delete(i64),
}

fn guarantor_mode(layout: GuarantorLayout) -> PickMode {
    PickMode::Multi(layout.max_guarantors())
}

impl LoanPanel {
    /// 创建新的借款面板
    pub fn new(layout: GuarantorLayout) -> Self {
        Self {
            borrower_picker: PersonPicker::new("borrowers", "已选借款人", PickMode::Single),
            guarantor_picker: PersonPicker::new(
                "guarantors",
                "已选担保人",
                guarantor_mode(layout),
            ),
            form: LoanForm::new(Local::now().date_naive()),
            persons: Vec::new(),
            loans: Vec::new(),
            search: String::new(),
            selected_loan: None,
            selected_guarantors: Vec::new(),
            hint: None,
        }
    }

    /// 切换数据库时清空表单、搜索和选择，并按新库的担保人结构调整上限
    pub fn reset(&mut self, layout: GuarantorLayout) {
        self.guarantor_picker.set_mode(guarantor_mode(layout));
        self.borrower_picker.clear();
        self.guarantor_picker.clear();
        self.form = LoanForm::new(self.form.date);
        self.persons.clear();
        self.loans.clear();
        self.search.clear();
        self.selected_loan = None;
        self.selected_guarantors.clear();
        self.hint = None;
    }

    /// 重新加载人员和借款
    pub fn refresh(&mut self, db: &Database) -> Result<()> {
        self.persons = db.list_persons()?;
        self.borrower_picker.retain_existing(&self.persons);
        self.guarantor_picker.retain_existing(&self.persons);
        self.refresh_loans(db)
    }

    /// 只刷新借款列表
    pub fn refresh_loans(&mut self, db: &Database) -> Result<()> {
        self.loans = db.list_loans()?;
        if let Some(id) = self.selected_loan {
            if !self.loans.iter().any(|l| l.id == id) {
                self.selected_loan = None;
                self.selected_guarantors.clear();
            }
        }
        Ok(())
    }

    /// 提交借款表单
    ///
    /// 成功后清空金额、利率、说明和已选人员，并刷新借款列表。
    pub fn add_loan(&mut self, db: &mut Database) -> Result<i64> {
        self.form.borrower_id = self.borrower_picker.selected_one();
        self.form.guarantor_ids = self.guarantor_picker.selected().to_vec();

        let loan = validate_loan(&self.form, db.layout())?;
        let id = db.add_loan(&loan)?;

        self.form = LoanForm::new(self.form.date);
        self.borrower_picker.clear();
        self.guarantor_picker.clear();
        self.refresh_loans(db)?;
        Ok(id)
    }

    /// 选中借款并加载其担保人
    pub fn load_details(&mut self, db: &Database, id: i64) -> Result<()> {
        self.selected_guarantors = db.loan_guarantors(id)?;
        self.selected_loan = Some(id);
        Ok(())
    }

    /// 删除借款
    pub fn delete_loan(&mut self, db: &Database, id: i64) -> Result<()> {
        db.delete_loan(id)?;
        self.refresh_loans(db)
    }

    /// 渲染借款面板
    pub fn render(&mut self, ui: &mut Ui) -> LoanPanelAction {
        let mut action = LoanPanelAction::None;

        ui.columns(2, |columns| {
            columns[0].heading("借款人");
            if let Some(hint) = self.borrower_picker.render(&mut columns[0], &self.persons) {
                self.hint = Some(hint);
            }

            columns[1].heading("担保人");
            if let Some(hint) = self.guarantor_picker.render(&mut columns[1], &self.persons) {
                self.hint = Some(hint);
            }
        });

        if let Some(hint) = &self.hint {
            ui.label(RichText::new(format!("⚠️ {}", hint)).color(egui::Color32::YELLOW));
        }

        ui.separator();

        // 借款表单
        ui.group(|ui| {
            egui::Grid::new("loan_form")
                .num_columns(4)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("金额 *");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.form.amount)
                            .hint_text("例如 1,250,000")
                            .desired_width(160.0),
                    );
                    ui.label("利率 %");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.form.percentage)
                            .hint_text("可选")
                            .desired_width(80.0),
                    );
                    ui.end_row();

                    ui.label("说明");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.form.description)
                            .desired_width(260.0),
                    );
                    ui.label("日期");
                    ui.add(DatePickerButton::new(&mut self.form.date));
                    ui.end_row();
                });

            ui.horizontal(|ui| {
                if ui.button("➕ 添加借款").clicked() {
                    self.hint = None;
                    action = LoanPanelAction::Add;
                }
                if ui.button("🧹 清空").clicked() {
                    self.form = LoanForm::new(self.form.date);
                    self.borrower_picker.clear();
                    self.guarantor_picker.clear();
                    self.hint = None;
                }
            });
        });

        ui.separator();

        // 借款列表工具栏
        ui.horizontal(|ui| {
            ui.heading("📋 借款列表");
            ui.separator();
            ui.label("🔍");
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("按借款人、担保人、说明搜索...")
                    .desired_width(220.0),
            );
            let has_selection = self.selected_loan.is_some();
            if ui.add_enabled(has_selection, egui::Button::new("🗑️ 删除所选")).clicked() {
                if let Some(id) = self.selected_loan {
                    action = LoanPanelAction::Delete(id);
                }
            }
        });

        if let Some(id) = self.render_loan_table(ui) {
            action = LoanPanelAction::Select(id);
        }

        self.render_details(ui);

        action
    }

    /// 选中借款的担保人
    fn render_details(&self, ui: &mut Ui) {
        let Some(id) = self.selected_loan else { return };

        ui.separator();
        ui.group(|ui| {
            ui.label(RichText::new(format!("借款 #{} 的担保人", id)).strong());
            if self.selected_guarantors.is_empty() {
                ui.label(RichText::new("无担保人").color(egui::Color32::GRAY));
            }
            for person in &self.selected_guarantors {
                ui.horizontal(|ui| {
                    ui.label(&person.name);
                    ui.separator();
                    ui.label(&person.ssn);
                    ui.separator();
                    ui.label(person.job.as_deref().unwrap_or("-"));
                    ui.separator();
                    ui.label(&person.score);
                });
            }
        });
    }

    /// 渲染借款表格，返回被点击的借款
    fn render_loan_table(&self, ui: &mut Ui) -> Option<i64> {
        let visible = filter_loans(&self.loans, &SearchQuery::new(&self.search));
        let mut clicked = None;

        ui.push_id("loan_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .sense(egui::Sense::click())
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::initial(50.0).at_least(40.0))
                .column(Column::initial(140.0).at_least(80.0))
                .column(Column::initial(120.0).at_least(60.0))
                .column(Column::initial(60.0).at_least(40.0))
                .column(Column::initial(90.0).at_least(80.0))
                .column(Column::initial(200.0).at_least(80.0))
                .column(Column::remainder())
                .min_scrolled_height(0.0)
                .header(22.0, |mut header| {
                    for title in ["ID", "借款人", "金额", "利率", "日期", "担保人", "说明"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for &index in &visible {
                        let loan = &self.loans[index];
                        body.row(22.0, |mut row| {
                            row.set_selected(self.selected_loan == Some(loan.id));
                            row.col(|ui| {
                                ui.label(loan.id.to_string());
                            });
                            row.col(|ui| match &loan.borrower_name {
                                Some(name) => {
                                    ui.label(name);
                                }
                                None => {
                                    ui.label(
                                        RichText::new(format!("#{}", loan.borrower_id))
                                            .color(egui::Color32::GRAY),
                                    );
                                }
                            });
                            row.col(|ui| {
                                ui.label(format_amount(loan.amount));
                            });
                            row.col(|ui| {
                                ui.label(
                                    loan.percentage
                                        .map(|p| format!("{}%", p))
                                        .unwrap_or_default(),
                                );
                            });
                            row.col(|ui| {
                                ui.label(&loan.date);
                            });
                            row.col(|ui| {
                                let names = loan.guarantor_names.join("، ");
                                ui.label(names);
                            });
                            row.col(|ui| {
                                ui.label(&loan.description);
                            });
                            if row.response().clicked() {
                                clicked = Some(loan.id);
                            }
                        });
                    }
                });
        });

        clicked
    }
}
