//! 人员管理面板
//!
//! 搜索表格 + 添加/编辑/删除表单。

use crate::core::error::Result;
use crate::core::filter::{filter_persons, SearchQuery};
use crate::core::models::{Person, Score};
use crate::core::validation::{validate_person, PersonForm};
use crate::storage::database::Database;
use crate::ui::styles::Theme;
use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

/// 人员面板
#[derive(Default)]
pub struct PersonPanel {
    theme: Theme,
    /// 当前人员列表（数据库快照）
    persons: Vec<Person>,
    /// 搜索文本
    search: String,
    /// 表单
    form: PersonForm,
    /// 正在编辑的人员ID
    editing: Option<i64>,
    /// 表格中选中的人员ID
    selected: Option<i64>,
}

/// 人员面板操作
#[derive(Debug, PartialEq)]
pub enum PersonPanelAction {
    None,
    Add,
    SaveEdit(i64),
    Delete(i64),
}

impl PersonPanel {
    /// 创建新的人员面板
    pub fn new() -> Self {
        Self::default()
    }

    /// 重新加载人员列表
    pub fn refresh(&mut self, db: &Database) -> Result<()> {
        self.persons = db.list_persons()?;
        if let Some(id) = self.selected {
            if !self.persons.iter().any(|p| p.id == id) {
                self.reset_selection();
            }
        }
        tracing::debug!("已加载 {} 名人员", self.persons.len());
        Ok(())
    }

    /// 提交添加表单
    ///
    /// 成功后清空表单并刷新列表；失败时表单保持不变。
    pub fn add_person(&mut self, db: &Database) -> Result<i64> {
        let person = validate_person(&self.form)?;
        let id = db.add_person(&person)?;
        self.form.clear();
        self.refresh(db)?;
        Ok(id)
    }

    /// 保存编辑
    pub fn save_edit(&mut self, db: &Database, id: i64) -> Result<()> {
        let person = validate_person(&self.form)?;
        db.update_person(id, &person)?;
        self.editing = None;
        self.form.clear();
        self.refresh(db)
    }

    /// 删除人员
    pub fn delete_person(&mut self, db: &Database, id: i64) -> Result<()> {
        db.delete_person(id)?;
        if self.editing == Some(id) {
            self.editing = None;
            self.form.clear();
        }
        self.refresh(db)
    }

    /// 人员姓名（确认对话框用）
    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.persons
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    /// 加载人员到表单
    fn load_for_edit(&mut self, id: i64) {
        if let Some(person) = self.persons.iter().find(|p| p.id == id) {
            let grade = Score::parse(&person.score);
            self.form = PersonForm {
                name: person.name.clone(),
                ssn: person.ssn.clone(),
                job: person.job.clone().unwrap_or_default(),
                score: grade.unwrap_or_default(),
                stored_score: grade.is_none().then(|| person.score.clone()),
            };
            self.editing = Some(id);
        }
    }

    /// 切换数据库时清空表单、搜索和选择
    pub fn reset(&mut self) {
        self.persons.clear();
        self.search.clear();
        self.form.clear();
        self.reset_selection();
    }

    /// 重置选择
    pub fn reset_selection(&mut self) {
        self.selected = None;
        self.editing = None;
    }

    /// 渲染人员面板
    pub fn render(&mut self, ui: &mut Ui) -> PersonPanelAction {
        let mut action = PersonPanelAction::None;

        ui.horizontal(|ui| {
            ui.heading("👥 人员");
            ui.separator();
            ui.label("🔍");
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("搜索人员...")
                    .desired_width(220.0),
            );
            ui.label(
                RichText::new(format!("共 {} 人", self.persons.len()))
                    .small()
                    .color(egui::Color32::GRAY),
            );
        });

        ui.separator();

        // 表单
        ui.group(|ui| {
            let title = match self.editing {
                Some(id) => format!("✏️ 编辑人员 #{}", id),
                None => "➕ 新增人员".to_string(),
            };
            ui.label(RichText::new(title).strong());

            egui::Grid::new("person_form")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("姓名 *");
                    ui.text_edit_singleline(&mut self.form.name);
                    ui.end_row();

                    ui.label("身份证号 *");
                    ui.text_edit_singleline(&mut self.form.ssn);
                    ui.end_row();

                    ui.label("职业");
                    ui.text_edit_singleline(&mut self.form.job);
                    ui.end_row();

                    ui.label("信用评级");
                    let selected_text = match &self.form.stored_score {
                        Some(text) => text.clone(),
                        None => self.form.score.label().to_string(),
                    };
                    egui::ComboBox::from_id_salt("person_score")
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            for score in Score::ALL {
                                if ui
                                    .selectable_value(&mut self.form.score, score, score.label())
                                    .clicked()
                                {
                                    self.form.stored_score = None;
                                }
                            }
                        });
                    ui.end_row();
                });

            ui.horizontal(|ui| match self.editing {
                Some(id) => {
                    if ui.button("💾 保存").clicked() {
                        action = PersonPanelAction::SaveEdit(id);
                    }
                    if ui.button("❌ 取消").clicked() {
                        self.editing = None;
                        self.form.clear();
                    }
                }
                None => {
                    if ui.button("➕ 添加").clicked() {
                        action = PersonPanelAction::Add;
                    }
                    if ui.button("🧹 清空").clicked() {
                        self.form.clear();
                    }
                }
            });
        });

        ui.separator();

        ui.horizontal(|ui| {
            let has_selection = self.selected.is_some();
            if ui.add_enabled(has_selection, egui::Button::new("✏️ 编辑所选")).clicked() {
                if let Some(id) = self.selected {
                    self.load_for_edit(id);
                }
            }
            if ui.add_enabled(has_selection, egui::Button::new("🗑️ 删除所选")).clicked() {
                if let Some(id) = self.selected {
                    action = PersonPanelAction::Delete(id);
                }
            }
        });

        // 人员表格
        let visible = filter_persons(&self.persons, &SearchQuery::new(&self.search));
        let mut clicked = None;
        let mut double_clicked = None;

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .sense(egui::Sense::click())
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(50.0).at_least(40.0))
            .column(Column::initial(180.0).at_least(80.0))
            .column(Column::initial(140.0).at_least(80.0))
            .column(Column::initial(160.0).at_least(60.0))
            .column(Column::remainder())
            .min_scrolled_height(0.0)
            .header(22.0, |mut header| {
                for title in ["ID", "姓名", "身份证号", "职业", "信用评级"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for &index in &visible {
                    let person = &self.persons[index];
                    body.row(22.0, |mut row| {
                        row.set_selected(self.selected == Some(person.id));
                        row.col(|ui| {
                            ui.label(person.id.to_string());
                        });
                        row.col(|ui| {
                            ui.label(&person.name);
                        });
                        row.col(|ui| {
                            ui.label(&person.ssn);
                        });
                        row.col(|ui| {
                            ui.label(person.job.as_deref().unwrap_or(""));
                        });
                        row.col(|ui| {
                            ui.label(
                                RichText::new(&person.score)
                                    .color(self.theme.score_color(&person.score)),
                            );
                        });

                        let response = row.response();
                        if response.double_clicked() {
                            double_clicked = Some(person.id);
                        } else if response.clicked() {
                            clicked = Some(person.id);
                        }
                    });
                }
            });

        if let Some(id) = clicked {
            self.selected = Some(id);
        }
        if let Some(id) = double_clicked {
            self.selected = Some(id);
            self.load_for_edit(id);
        }

        action
    }
}
