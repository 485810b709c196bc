//! Notices shown as expiring toasts

use std::time::{Duration, Instant};
use egui::{Align2, Context, RichText};
use wb_core::Notice;

use crate::theme::notice_color;

/// A notice and when it was raised
#[derive(Debug, Clone)]
pub struct Toast {
    pub notice: Notice,
    pub raised: Instant,
}

/// On-screen notices, each dropped `ttl` after it was raised
#[derive(Debug, Clone)]
pub struct Toasts {
    ttl: Duration,
    items: Vec<Toast>,
}

impl Toasts {
    /// Create a new, empty set of toasts
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, items: Vec::new() }
    }

    pub fn push_all(&mut self, notices: impl IntoIterator<Item = Notice>, now: Instant) {
        self.items
            .extend(notices.into_iter().map(|notice| Toast { notice, raised: now }));
    }

    /// Drop toasts older than the time to live
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|toast| now.saturating_duration_since(toast.raised) < ttl);
    }

    /// Time until the next toast expires
    pub fn next_expiry(&self, now: Instant) -> Option<Duration> {
        self.items
            .iter()
            .map(|toast| (toast.raised + self.ttl).saturating_duration_since(now))
            .min()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    /// Draw the toasts in the bottom-right corner
    pub fn show(&mut self, ctx: &Context) {
        let now = Instant::now();
        self.expire(now);
        if let Some(wait) = self.next_expiry(now) {
            ctx.request_repaint_after(wait);
        }

        let mut dismissed = None;
        egui::Area::new("notice_toasts")
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.set_max_width(360.0);
                for (index, toast) in self.items.iter().enumerate() {
                    let color = notice_color(toast.notice.level);
                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, color))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(&toast.notice.title).strong().color(color));
                                if ui.small_button("✕").clicked() {
                                    dismissed = Some(index);
                                }
                            });
                            ui.label(&toast.notice.message);
                        });
                    ui.add_space(6.0);
                }
            });

        if let Some(index) = dismissed {
            self.items.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_after_ttl() {
        let start = Instant::now();
        let mut toasts = Toasts::new(Duration::from_secs(6));
        toasts.push_all(vec![Notice::warning("Could not fetch data", "404")], start);
        toasts.push_all(vec![Notice::info("Table loaded", "a.csv")], start + Duration::from_secs(4));

        toasts.expire(start + Duration::from_secs(5));
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts.next_expiry(start + Duration::from_secs(5)), Some(Duration::from_secs(1)));

        toasts.expire(start + Duration::from_secs(6));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.iter().next().map(|t| t.notice.title.as_str()), Some("Table loaded"));

        toasts.expire(start + Duration::from_secs(20));
        assert!(toasts.is_empty());
        assert_eq!(toasts.next_expiry(start), None);
    }
}
