//! 人员选择列表
//!
//! 带搜索框的人员表格，借款人（单选）和担保人（多选）共用。

use crate::core::filter::{filter_persons, SearchQuery};
use crate::core::models::Person;
use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

/// 选择模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    /// 单选
    Single,
    /// 多选，None 表示不限数量
    Multi(Option<usize>),
}

/// 人员选择器
pub struct PersonPicker {
    /// 表格ID
    id: &'static str,
    /// 已选标签前缀
    caption: &'static str,
    mode: PickMode,
    search: String,
    /// 已选人员ID（保持选择顺序）
    selected: Vec<i64>,
}

impl PersonPicker {
    pub fn new(id: &'static str, caption: &'static str, mode: PickMode) -> Self {
        Self {
            id,
            caption,
            mode,
            search: String::new(),
            selected: Vec::new(),
        }
    }

    /// 切换选择模式，超出上限的已选项从末尾丢弃
    pub fn set_mode(&mut self, mode: PickMode) {
        self.mode = mode;
        let keep = match mode {
            PickMode::Single => 1,
            PickMode::Multi(Some(max)) => max,
            PickMode::Multi(None) => usize::MAX,
        };
        self.selected.truncate(keep);
    }

    pub fn selected(&self) -> &[i64] {
        &self.selected
    }

    /// 单选结果
    pub fn selected_one(&self) -> Option<i64> {
        self.selected.first().copied()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// 丢弃已不存在的人员
    pub fn retain_existing(&mut self, persons: &[Person]) {
        self.selected.retain(|id| persons.iter().any(|p| p.id == *id));
    }

    /// 点击某人：单选时替换，多选时切换
    ///
    /// 多选已达上限时返回 false。
    pub fn pick(&mut self, id: i64) -> bool {
        match self.mode {
            PickMode::Single => {
                self.selected = vec![id];
                true
            }
            PickMode::Multi(max) => {
                if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                    self.selected.remove(pos);
                    return true;
                }
                if max.is_some_and(|m| self.selected.len() >= m) {
                    return false;
                }
                self.selected.push(id);
                true
            }
        }
    }

    /// 已选人员姓名
    pub fn selected_names(&self, persons: &[Person]) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|id| persons.iter().find(|p| p.id == *id))
            .map(|p| p.name.clone())
            .collect()
    }

    /// 渲染选择器，达到上限时返回提示
    pub fn render(&mut self, ui: &mut Ui, persons: &[Person]) -> Option<String> {
        let mut limit_hit = None;

        ui.horizontal(|ui| {
            ui.label("🔍");
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("按姓名、身份证号、职业搜索...")
                    .desired_width(220.0),
            );
            if let PickMode::Multi(Some(max)) = self.mode {
                ui.label(
                    RichText::new(format!("{}/{}", self.selected.len(), max))
                        .small()
                        .color(egui::Color32::GRAY),
                );
            }
        });

        let visible = filter_persons(persons, &SearchQuery::new(&self.search));
        let mut clicked = None;

        ui.push_id(self.id, |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .sense(egui::Sense::click())
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::initial(140.0).at_least(60.0))
                .column(Column::initial(120.0).at_least(60.0))
                .column(Column::remainder())
                .min_scrolled_height(0.0)
                .max_scroll_height(160.0)
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("姓名");
                    });
                    header.col(|ui| {
                        ui.strong("身份证号");
                    });
                    header.col(|ui| {
                        ui.strong("职业");
                    });
                })
                .body(|mut body| {
                    for &index in &visible {
                        let person = &persons[index];
                        body.row(20.0, |mut row| {
                            row.set_selected(self.selected.contains(&person.id));
                            row.col(|ui| {
                                ui.label(&person.name);
                            });
                            row.col(|ui| {
                                ui.label(&person.ssn);
                            });
                            row.col(|ui| {
                                ui.label(person.job.as_deref().unwrap_or(""));
                            });
                            if row.response().clicked() {
                                clicked = Some(person.id);
                            }
                        });
                    }
                });
        });

        if let Some(id) = clicked {
            if !self.pick(id) {
                if let PickMode::Multi(Some(max)) = self.mode {
                    limit_hit = Some(format!("最多只能选择 {} 名担保人", max));
                }
            }
        }

        let names = self.selected_names(persons);
        let text = if names.is_empty() {
            format!("{}: 未选择", self.caption)
        } else {
            format!("{}: {}", self.caption, names.join("، "))
        };
        ui.label(RichText::new(text).strong());

        limit_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, name: &str) -> Person {
        Person {
            id,
            name: name.to_string(),
            ssn: id.to_string(),
            job: None,
            score: String::new(),
        }
    }

    #[test]
    fn test_single_pick_replaces() {
        let mut picker = PersonPicker::new("b", "借款人", PickMode::Single);
        assert!(picker.pick(1));
        assert!(picker.pick(2));
        assert_eq!(picker.selected(), &[2]);
        assert_eq!(picker.selected_one(), Some(2));
    }

    #[test]
    fn test_multi_pick_toggles_and_limits() {
        let mut picker = PersonPicker::new("g", "担保人", PickMode::Multi(Some(2)));
        assert!(picker.pick(1));
        assert!(picker.pick(2));
        assert!(!picker.pick(3));
        assert_eq!(picker.selected(), &[1, 2]);

        assert!(picker.pick(1));
        assert_eq!(picker.selected(), &[2]);
        assert!(picker.pick(3));
        assert_eq!(picker.selected(), &[2, 3]);
    }

    #[test]
    fn test_set_mode_truncates() {
        let mut picker = PersonPicker::new("g", "担保人", PickMode::Multi(None));
        for id in 1..=4 {
            picker.pick(id);
        }
        picker.set_mode(PickMode::Multi(Some(1)));
        assert_eq!(picker.selected(), &[1]);
    }

    #[test]
    fn test_retain_existing_and_names() {
        let persons = vec![person(1, "Reza"), person(3, "Omid")];
        let mut picker = PersonPicker::new("g", "担保人", PickMode::Multi(None));
        picker.pick(3);
        picker.pick(2);
        picker.pick(1);
        picker.retain_existing(&persons);
        assert_eq!(picker.selected(), &[3, 1]);
        assert_eq!(picker.selected_names(&persons), vec!["Omid", "Reza"]);
    }
}
