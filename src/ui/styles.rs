//! 样式定义

use crate::core::models::Score;
use eframe::egui::{self, Color32, Rounding};

/// 颜色主题
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(66, 133, 244),      // 蓝色
            secondary: Color32::from_rgb(156, 156, 156),   // 灰色
            success: Color32::from_rgb(52, 168, 83),       // 绿色
            warning: Color32::from_rgb(251, 188, 4),       // 黄色
            error: Color32::from_rgb(234, 67, 53),         // 红色
        }
    }
}

impl Theme {
    /// 信用评级对应的颜色，自由文本评级显示为灰色
    pub fn score_color(&self, score: &str) -> Color32 {
        match Score::parse(score) {
            Some(Score::A) => self.success,
            Some(Score::B) => self.primary,
            Some(Score::C) => self.warning,
            Some(Score::D) => self.error,
            None => self.secondary,
        }
    }
}

/// 圆角设置
pub fn default_rounding() -> Rounding {
    Rounding::same(4.0)
}

/// 按钮样式
pub fn button_style(visuals: &mut egui::Visuals) {
    visuals.widgets.inactive.rounding = default_rounding();
    visuals.widgets.hovered.rounding = default_rounding();
    visuals.widgets.active.rounding = default_rounding();
}

/// 金额显示：整数部分加千位分隔符，有小数时保留两位
pub fn format_amount(amount: f64) -> String {
    let text = if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    };

    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_250_000.0), "1,250,000");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(-45000.0), "-45,000");
    }

    #[test]
    fn test_score_color() {
        let theme = Theme::default();
        assert_eq!(theme.score_color("A"), theme.success);
        assert_eq!(theme.score_color("d"), theme.error);
        assert_eq!(theme.score_color("خوب"), theme.secondary);
    }
}
