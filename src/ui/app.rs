//! 主应用程序
//!
//! 持有数据库连接，包含人员和借款两个标签页。

use crate::core::error::LedgerError;
use crate::core::models::{AppConfig, LoanTotals};
use crate::storage::config::ConfigManager;
use crate::storage::database::Database;
use crate::ui::dialogs::{
    ConfirmDialog, ConfirmResult, MessageDialog, MessageLevel, SettingsDialog, SettingsResult,
};
use crate::ui::loan_panel::{LoanPanel, LoanPanelAction};
use crate::ui::person_panel::{PersonPanel, PersonPanelAction};
use crate::ui::styles::{button_style, format_amount};
use eframe::egui::{self, RichText};

/// 标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Persons,
    Loans,
}

/// 待确认的删除
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingDelete {
    Person(i64),
    Loan(i64),
}

/// 主应用程序
pub struct LedgerApp {
    /// 配置管理器
    config_manager: ConfigManager,
    /// 配置
    config: AppConfig,
    /// 数据库连接，打开失败时为空
    db: Option<Database>,
    /// 当前标签页
    tab: Tab,
    /// 人员面板
    person_panel: PersonPanel,
    /// 借款面板
    loan_panel: LoanPanel,
    /// 消息对话框
    message_dialog: MessageDialog,
    /// 删除确认对话框
    confirm_dialog: ConfirmDialog,
    /// 设置对话框
    settings_dialog: SettingsDialog,
    /// 待确认的删除
    pending_delete: Option<PendingDelete>,
    /// 状态消息
    status_message: String,
    /// 借款汇总
    totals: LoanTotals,
}

impl LedgerApp {
    /// 创建新的应用实例
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        button_style(&mut style.visuals);
        cc.egui_ctx.set_style(style);

        let config_manager = ConfigManager::new(ConfigManager::default_path());
        let mut message_dialog = MessageDialog::default();
        let config = match config_manager.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("读取配置失败，使用默认配置: {}", e);
                message_dialog.show(
                    MessageLevel::Warning,
                    "配置错误",
                    &format!("读取配置失败，已使用默认配置: {}", e),
                );
                AppConfig::default()
            }
        };

        let mut app = Self {
            person_panel: PersonPanel::new(),
            loan_panel: LoanPanel::new(config.guarantor_layout),
            config_manager,
            config,
            db: None,
            tab: Tab::Persons,
            message_dialog,
            confirm_dialog: ConfirmDialog::default(),
            settings_dialog: SettingsDialog::default(),
            pending_delete: None,
            status_message: String::new(),
            totals: LoanTotals::default(),
        };
        app.open_database();
        app
    }

    /// 按当前配置打开数据库
    fn open_database(&mut self) {
        let path = ConfigManager::database_path(&self.config);
        self.db = None;

        match Database::open(&path, self.config.guarantor_layout) {
            Ok(db) => {
                self.person_panel.reset();
                self.loan_panel.reset(db.layout());
                self.db = Some(db);
                self.status_message = format!("数据库: {}", path.display());
                self.refresh_all();
            }
            Err(e) => {
                tracing::warn!("打开数据库失败: {}", e);
                self.status_message = "数据库未打开".to_string();
                self.message_dialog.show(
                    MessageLevel::Critical,
                    "数据库错误",
                    &format!("无法打开 {}: {}", path.display(), e),
                );
            }
        }
    }

    /// 刷新两个面板和汇总
    fn refresh_all(&mut self) {
        let Some(db) = self.db.as_ref() else { return };

        let result = self
            .person_panel
            .refresh(db)
            .and_then(|_| self.loan_panel.refresh(db))
            .and_then(|_| db.loan_totals());

        match result {
            Ok(totals) => self.totals = totals,
            Err(e) => self.report_error(&e),
        }
    }

    /// 只刷新借款汇总
    fn refresh_totals(&mut self) {
        let Some(db) = self.db.as_ref() else { return };
        match db.loan_totals() {
            Ok(totals) => self.totals = totals,
            Err(e) => self.report_error(&e),
        }
    }

    /// 显示错误：用户输入问题为警告，其余为严重错误
    fn report_error(&mut self, error: &LedgerError) {
        if error.is_user_error() {
            tracing::debug!("输入被拒绝: {}", error);
            self.message_dialog
                .show(MessageLevel::Warning, "输入错误", &error.to_string());
        } else {
            tracing::warn!("操作失败: {}", error);
            self.message_dialog
                .show(MessageLevel::Critical, "数据库错误", &error.to_string());
        }
    }

    fn handle_person_action(&mut self, action: PersonPanelAction) {
        let Some(db) = self.db.as_ref() else { return };

        let result = match action {
            PersonPanelAction::None => return,
            PersonPanelAction::Add => self
                .person_panel
                .add_person(db)
                .map(|id| format!("已添加人员 #{}", id)),
            PersonPanelAction::SaveEdit(id) => self
                .person_panel
                .save_edit(db, id)
                .map(|_| format!("已保存人员 #{}", id)),
            PersonPanelAction::Delete(id) => {
                let name = self.person_panel.name_of(id).unwrap_or_default();
                self.confirm_dialog.show(
                    "确认删除",
                    &format!("确定要删除人员“{}”吗？", name),
                );
                self.pending_delete = Some(PendingDelete::Person(id));
                return;
            }
        };

        match result {
            Ok(message) => {
                self.status_message = message;
                // 人员变化需要同步到借款面板的选择列表
                if let Err(e) = self.loan_panel.refresh(db) {
                    self.report_error(&e);
                }
            }
            Err(e) => self.report_error(&e),
        }
    }

    fn handle_loan_action(&mut self, action: LoanPanelAction) {
        let result = match action {
            LoanPanelAction::None => return,
            LoanPanelAction::Add => {
                let Some(db) = self.db.as_mut() else { return };
                self.loan_panel
                    .add_loan(db)
                    .map(|id| format!("已添加借款 #{}", id))
            }
            LoanPanelAction::Select(id) => {
                let Some(db) = self.db.as_ref() else { return };
                if let Err(e) = self.loan_panel.load_details(db, id) {
                    self.report_error(&e);
                }
                return;
            }
            LoanPanelAction::Delete(id) => {
                self.confirm_dialog
                    .show("确认删除", &format!("确定要删除借款 #{} 吗？", id));
                self.pending_delete = Some(PendingDelete::Loan(id));
                return;
            }
        };

        match result {
            Ok(message) => {
                self.status_message = message;
                self.refresh_totals();
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// 执行已确认的删除
    fn execute_delete(&mut self, pending: PendingDelete) {
        let Some(db) = self.db.as_ref() else { return };

        let result = match pending {
            PendingDelete::Person(id) => self
                .person_panel
                .delete_person(db, id)
                .and_then(|_| self.loan_panel.refresh(db))
                .map(|_| format!("已删除人员 #{}", id)),
            PendingDelete::Loan(id) => self
                .loan_panel
                .delete_loan(db, id)
                .map(|_| format!("已删除借款 #{}", id)),
        };

        match result {
            Ok(message) => {
                self.status_message = message;
                self.refresh_totals();
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// 保存设置并应用
    fn save_settings(&mut self, config: AppConfig) {
        if let Err(e) = self.config_manager.save(&config) {
            tracing::warn!("保存配置失败: {}", e);
            self.message_dialog.show(
                MessageLevel::Critical,
                "配置错误",
                &format!("保存配置失败: {}", e),
            );
            return;
        }
        self.apply_config(config);
    }

    /// 应用新配置，数据库路径变化时重新打开数据库
    fn apply_config(&mut self, config: AppConfig) {
        let reopen = ConfigManager::database_path(&config)
            != ConfigManager::database_path(&self.config);
        self.config = config;
        if reopen || self.db.is_none() {
            self.open_database();
        }
        if self.db.is_some() {
            self.status_message = "设置已保存".to_string();
        }
    }
}

impl eframe::App for LedgerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 顶部菜单栏
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("文件", |ui| {
                    if ui.button("⚙️ 设置").clicked() {
                        self.settings_dialog.show(
                            self.config.database_path.as_ref(),
                            self.config.guarantor_layout,
                            self.db.as_ref().map(|db| db.layout()),
                        );
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("❌ 退出").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("视图", |ui| {
                    if ui.button("🔄 刷新").clicked() {
                        self.refresh_all();
                        ui.close_menu();
                    }
                });
            });
        });

        // 底部状态栏
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(db) = &self.db {
                        ui.label(
                            RichText::new(db.layout().label())
                                .small()
                                .color(egui::Color32::GRAY),
                        );
                        ui.separator();
                    }
                    ui.label(format!(
                        "借款: {} 笔，合计 {}",
                        self.totals.count,
                        format_amount(self.totals.total_amount)
                    ));
                });
            });
        });

        // 主内容区域
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Persons, "👥 人员");
                ui.selectable_value(&mut self.tab, Tab::Loans, "💰 借款列表");
            });
            ui.separator();

            if self.db.is_none() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.label(RichText::new("数据库未打开").size(24.0));
                    ui.label("请在 文件 → 设置 中选择数据库文件");
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| match self.tab {
                    Tab::Persons => {
                        let action = self.person_panel.render(ui);
                        self.handle_person_action(action);
                    }
                    Tab::Loans => {
                        let action = self.loan_panel.render(ui);
                        self.handle_loan_action(action);
                    }
                });
        });

        // 渲染对话框
        self.render_dialogs(ctx);
    }
}

impl LedgerApp {
    /// 渲染对话框
    fn render_dialogs(&mut self, ctx: &egui::Context) {
        self.message_dialog.render(ctx);

        match self.confirm_dialog.render(ctx) {
            ConfirmResult::Confirm => {
                if let Some(pending) = self.pending_delete.take() {
                    self.execute_delete(pending);
                }
            }
            ConfirmResult::Cancel => {
                self.pending_delete = None;
            }
            ConfirmResult::None => {}
        }

        match self.settings_dialog.render(ctx) {
            SettingsResult::Save => {
                let config = AppConfig {
                    database_path: self.settings_dialog.database_path(),
                    guarantor_layout: self.settings_dialog.guarantor_layout,
                };
                self.save_settings(config);
            }
            SettingsResult::Reset => match self.config_manager.reset() {
                Ok(()) => self.apply_config(AppConfig::default()),
                Err(e) => {
                    tracing::warn!("重置配置失败: {}", e);
                    self.message_dialog.show(
                        MessageLevel::Critical,
                        "配置错误",
                        &format!("重置配置失败: {}", e),
                    );
                }
            },
            SettingsResult::Cancel => {}
            SettingsResult::None => {}
        }
    }
}
