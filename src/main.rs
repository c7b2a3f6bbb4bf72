//! Loan Ledger - 本地人员、借款与担保人台账
//!
//! 所有数据保存在本地SQLite文件中，界面操作直接同步执行SQL。

pub mod core;
pub mod storage;
pub mod ui;

use anyhow::Result;
use eframe::egui::{self, FontData, FontDefinitions, FontFamily};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 配置中文字体
fn setup_custom_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();

    // 尝试加载系统中文字体
    let font_paths = [
        "C:/Windows/Fonts/msyh.ttc",      // 微软雅黑
        "C:/Windows/Fonts/simsun.ttc",    // 宋体
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/System/Library/Fonts/PingFang.ttc",
    ];

    let mut font_loaded = false;
    for path in &font_paths {
        if let Ok(font_data) = std::fs::read(path) {
            fonts.font_data.insert(
                "cjk_font".to_owned(),
                FontData::from_owned(font_data).into(),
            );

            // 将中文字体设为首选
            fonts.families
                .entry(FontFamily::Proportional)
                .or_default()
                .insert(0, "cjk_font".to_owned());

            fonts.families
                .entry(FontFamily::Monospace)
                .or_default()
                .insert(0, "cjk_font".to_owned());

            font_loaded = true;
            tracing::info!("已加载中文字体: {}", path);
            break;
        }
    }

    if !font_loaded {
        tracing::warn!("未能加载中文字体，界面可能显示乱码");
    }

    ctx.set_fonts(fonts);
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("启动 Loan Ledger");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Loan Ledger - 借款台账"),
        ..Default::default()
    };

    eframe::run_native(
        "LoanLedger",
        options,
        Box::new(|cc| {
            setup_custom_fonts(&cc.egui_ctx);
            Ok(Box::new(ui::app::LedgerApp::new(cc)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI启动失败: {}", e))?;

    Ok(())
}
