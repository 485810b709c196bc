use egui::{Color32, Context, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};
use std::collections::BTreeMap;
use wb_core::{NoticeLevel, ThemeSettings};

/// Apply the workbench theme: a dark or light palette with a blue accent
pub fn apply_theme(ctx: &Context, settings: &ThemeSettings) {
    let mut style = Style::default();
    let mut visuals = if settings.dark_mode { Visuals::dark() } else { Visuals::light() };

    if settings.dark_mode {
        let panel_bg = Color32::from_rgb(31, 31, 31);
        let widget_bg = Color32::from_rgb(40, 40, 40);
        let text_color = Color32::from_rgb(220, 220, 220);

        visuals.window_fill = panel_bg;
        visuals.panel_fill = panel_bg;
        visuals.extreme_bg_color = Color32::from_rgb(23, 23, 23);
        visuals.faint_bg_color = widget_bg;
        visuals.code_bg_color = Color32::from_rgb(35, 35, 35);

        for (widget, bg, border) in [
            (&mut visuals.widgets.noninteractive, widget_bg, 60),
            (&mut visuals.widgets.inactive, widget_bg, 70),
            (&mut visuals.widgets.hovered, Color32::from_rgb(50, 50, 50), 80),
        ] {
            widget.bg_fill = bg;
            widget.bg_stroke = Stroke::new(1.0, Color32::from_gray(border));
            widget.fg_stroke = Stroke::new(1.0, text_color);
        }
        visuals.widgets.active.bg_fill = Color32::from_rgb(60, 60, 60);
        visuals.widgets.active.bg_stroke = Stroke::new(1.0, accent_color());
    }

    for widget in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widget.rounding = Rounding::same(4.0);
    }
    visuals.selection.bg_fill = accent_color().linear_multiply(0.3);
    visuals.selection.stroke = Stroke::new(1.0, accent_color());
    visuals.hyperlink_color = accent_color();

    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.indent = 20.0;

    let mut font_sizes = BTreeMap::new();
    font_sizes.insert(TextStyle::Small, FontId::new(11.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Body, FontId::new(13.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Button, FontId::new(13.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace));
    style.text_styles = font_sizes;

    ctx.set_style(style);
    ctx.set_visuals(visuals);
    ctx.set_pixels_per_point(settings.scale_factor.clamp(0.5, 3.0));
}

/// Get the accent color for the theme
pub fn accent_color() -> Color32 {
    Color32::from_rgb(100, 150, 250)
}

pub fn error_color() -> Color32 {
    Color32::from_rgb(230, 80, 80)
}

pub fn warning_color() -> Color32 {
    Color32::from_rgb(230, 180, 80)
}

pub fn success_color() -> Color32 {
    Color32::from_rgb(80, 200, 120)
}

/// Color of a notice's border and icon
pub fn notice_color(level: NoticeLevel) -> Color32 {
    match level {
        NoticeLevel::Info => success_color(),
        NoticeLevel::Warning => warning_color(),
        NoticeLevel::Error => error_color(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_colors_are_distinct() {
        let colors = [
            notice_color(NoticeLevel::Info),
            notice_color(NoticeLevel::Warning),
            notice_color(NoticeLevel::Error),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_eq!(colors[2], error_color());
    }
}
