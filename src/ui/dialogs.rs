//! 对话框组件

use crate::core::models::GuarantorLayout;
use eframe::egui::{self, RichText};
use std::path::PathBuf;

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Critical,
}

impl MessageLevel {
    fn icon(&self) -> &'static str {
        match self {
            MessageLevel::Info => "ℹ️",
            MessageLevel::Warning => "⚠️",
            MessageLevel::Critical => "⛔",
        }
    }

    fn color(&self) -> egui::Color32 {
        match self {
            MessageLevel::Info => egui::Color32::LIGHT_BLUE,
            MessageLevel::Warning => egui::Color32::YELLOW,
            MessageLevel::Critical => egui::Color32::from_rgb(234, 67, 53),
        }
    }
}

/// 消息对话框
pub struct MessageDialog {
    /// 是否显示
    pub visible: bool,
    pub level: MessageLevel,
    pub title: String,
    pub message: String,
}

impl Default for MessageDialog {
    fn default() -> Self {
        Self {
            visible: false,
            level: MessageLevel::Info,
            title: String::new(),
            message: String::new(),
        }
    }
}

impl MessageDialog {
    /// 显示对话框
    pub fn show(&mut self, level: MessageLevel, title: &str, message: &str) {
        self.visible = true;
        self.level = level;
        self.title = title.to_string();
        self.message = message.to_string();
    }

    /// 渲染对话框，返回是否被关闭
    pub fn render(&mut self, ctx: &egui::Context) -> bool {
        if !self.visible {
            return false;
        }

        let mut closed = false;
        egui::Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(self.level.icon()).size(24.0));
                    ui.label(RichText::new(&self.message).color(self.level.color()));
                });

                ui.separator();

                if ui.button("✓ 确定").clicked() {
                    closed = true;
                }
            });

        if closed {
            self.visible = false;
        }
        closed
    }
}

/// 确认对话框
#[derive(Default)]
pub struct ConfirmDialog {
    /// 是否显示
    pub visible: bool,
    pub title: String,
    pub message: String,
}

impl ConfirmDialog {
    /// 显示对话框
    pub fn show(&mut self, title: &str, message: &str) {
        self.visible = true;
        self.title = title.to_string();
        self.message = message.to_string();
    }

    /// 渲染对话框
    pub fn render(&mut self, ctx: &egui::Context) -> ConfirmResult {
        let mut result = ConfirmResult::None;

        if !self.visible {
            return result;
        }

        egui::Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.label(&self.message);

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("✓ 确认").clicked() {
                        result = ConfirmResult::Confirm;
                        self.visible = false;
                    }
                    if ui.button("✗ 取消").clicked() {
                        result = ConfirmResult::Cancel;
                        self.visible = false;
                    }
                });
            });

        result
    }
}

/// 确认对话框结果
#[derive(Debug, PartialEq)]
pub enum ConfirmResult {
    None,
    Confirm,
    Cancel,
}

/// 设置对话框
pub struct SettingsDialog {
    /// 是否显示
    pub visible: bool,
    /// 数据库路径（空表示默认位置）
    pub database_path: String,
    /// 新建数据库使用的担保人结构
    pub guarantor_layout: GuarantorLayout,
    /// 当前数据库实际使用的结构
    pub active_layout: Option<GuarantorLayout>,
}

impl Default for SettingsDialog {
    fn default() -> Self {
        Self {
            visible: false,
            database_path: String::new(),
            guarantor_layout: GuarantorLayout::default(),
            active_layout: None,
        }
    }
}

impl SettingsDialog {
    /// 显示对话框
    pub fn show(
        &mut self,
        database_path: Option<&PathBuf>,
        layout: GuarantorLayout,
        active_layout: Option<GuarantorLayout>,
    ) {
        self.visible = true;
        self.database_path = database_path
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        self.guarantor_layout = layout;
        self.active_layout = active_layout;
    }

    /// 对话框中的数据库路径，空字符串表示默认
    pub fn database_path(&self) -> Option<PathBuf> {
        let trimmed = self.database_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// 渲染对话框
    pub fn render(&mut self, ctx: &egui::Context) -> SettingsResult {
        let mut result = SettingsResult::None;

        if !self.visible {
            return result;
        }

        egui::Window::new("⚙️ 设置")
            .collapsible(false)
            .resizable(true)
            .default_width(480.0)
            .show(ctx, |ui| {
                ui.heading("数据库");
                ui.horizontal(|ui| {
                    ui.label("文件:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.database_path)
                            .hint_text("留空使用默认位置")
                            .desired_width(300.0),
                    );
                    if ui.button("📂 浏览").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("SQLite", &["db", "sqlite", "sqlite3"])
                            .save_file()
                        {
                            self.database_path = path.to_string_lossy().to_string();
                        }
                    }
                });

                ui.separator();

                ui.heading("担保人存储方式");
                for layout in GuarantorLayout::ALL {
                    let limit = match layout.max_guarantors() {
                        Some(max) => format!("最多 {} 名", max),
                        None => "不限数量".to_string(),
                    };
                    ui.radio_value(
                        &mut self.guarantor_layout,
                        layout,
                        format!("{}（{}）", layout.label(), limit),
                    );
                }

                if let Some(active) = self.active_layout {
                    if active != self.guarantor_layout {
                        ui.label(
                            RichText::new(format!(
                                "⚠️ 当前数据库已使用“{}”，此设置仅对新建的数据库生效",
                                active.label()
                            ))
                            .small()
                            .color(egui::Color32::YELLOW),
                        );
                    }
                }

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("💾 保存").clicked() {
                        result = SettingsResult::Save;
                        self.visible = false;
                    }
                    if ui.button("↺ 恢复默认").clicked() {
                        result = SettingsResult::Reset;
                        self.visible = false;
                    }
                    if ui.button("❌ 取消").clicked() {
                        result = SettingsResult::Cancel;
                        self.visible = false;
                    }
                });
            });

        result
    }
}

/// 设置对话框结果
#[derive(Debug, PartialEq)]
pub enum SettingsResult {
    None,
    Save,
    Reset,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_database_path() {
        let mut dialog = SettingsDialog::default();
        dialog.show(None, GuarantorLayout::FixedColumns, None);
        assert!(dialog.visible);
        assert_eq!(dialog.database_path(), None);
        assert_eq!(dialog.guarantor_layout, GuarantorLayout::FixedColumns);

        dialog.database_path = "  /tmp/people.db ".to_string();
        assert_eq!(dialog.database_path(), Some(PathBuf::from("/tmp/people.db")));
    }

    #[test]
    fn test_message_dialog_show() {
        let mut dialog = MessageDialog::default();
        dialog.show(MessageLevel::Critical, "数据库错误", "disk I/O error");
        assert!(dialog.visible);
        assert_eq!(dialog.level, MessageLevel::Critical);
        assert_eq!(dialog.message, "disk I/O error");
    }
}
