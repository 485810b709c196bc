//! SQL workbench: an editable query over every registered table

use egui::{RichText, Ui};
use tracing::debug;
use wb_data::{Frame, Interaction, QueryResult, Session};

use crate::{ResultGrid, SpaceView, SpaceViewId, ViewerContext};

/// Shown instead of a result while the buffer is blank
pub const EMPTY_QUERY_PROMPT: &str = "Execute non empty query";

/// What the workbench shows below the editor
#[derive(Debug, Clone, Default)]
pub enum QueryOutcome {
    /// Nothing to run
    #[default]
    Idle,
    Executed(QueryResult),
    /// The engine's message
    Failed(String),
}

impl QueryOutcome {
    /// Run `sql` unless it is blank
    pub fn evaluate(session: &mut Session, sql: &str) -> Self {
        if sql.trim().is_empty() {
            return QueryOutcome::Idle;
        }
        match session.execute(sql) {
            Ok(result) => QueryOutcome::Executed(result),
            Err(e) => QueryOutcome::Failed(e.message),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, QueryOutcome::Idle)
    }
}

/// The "SQL Workbench" tab
#[derive(Debug, Default)]
pub struct WorkbenchView {
    buffer: String,
    /// Session query the buffer was last seeded from
    seeded: String,
    outcome: QueryOutcome,
    /// Cycle the outcome was computed for
    evaluated: Option<u64>,
}

impl WorkbenchView {
    /// Create a new, empty workbench
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn outcome(&self) -> &QueryOutcome {
        &self.outcome
    }

    /// Run the session's query, once per cycle. The editor is reseeded only
    /// when that query changed, so an unsubmitted draft survives other
    /// interactions.
    pub fn sync(&mut self, session: &mut Session, frame: &Frame) {
        if self.evaluated == Some(frame.cycle) {
            return;
        }
        debug!("Evaluating workbench query for cycle {}", frame.cycle);
        if frame.query != self.seeded {
            self.buffer = frame.query.clone();
            self.seeded = frame.query.clone();
        }
        self.outcome = QueryOutcome::evaluate(session, &frame.query);
        self.evaluated = Some(frame.cycle);
    }

    /// The interaction that runs the current buffer
    pub fn submit(&self) -> Interaction {
        Interaction::EditQuery(self.buffer.clone())
    }
}

impl SpaceView for WorkbenchView {
    fn id(&self) -> SpaceViewId {
        SpaceViewId::Workbench
    }

    fn on_cycle(&mut self, ctx: &mut ViewerContext<'_>) {
        self.sync(ctx.session, ctx.frame);
    }

    fn ui(&mut self, ctx: &mut ViewerContext<'_>, ui: &mut Ui) {
        self.sync(ctx.session, ctx.frame);

        let editor = ui.add(
            egui::TextEdit::multiline(&mut self.buffer)
                .code_editor()
                .desired_rows(6)
                .desired_width(f32::INFINITY)
                .hint_text("select * from ..."),
        );
        let shortcut = editor.has_focus()
            && ui.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Enter));

        let mut run = shortcut;
        ui.horizontal(|ui| {
            run |= ui.button("▶ Run").clicked();
            ui.label(RichText::new("Ctrl+Enter").weak().small());
        });
        if run {
            ctx.request(self.submit());
        }
        ui.separator();

        match &self.outcome {
            QueryOutcome::Idle => {
                ui.label(RichText::new(EMPTY_QUERY_PROMPT).weak());
            }
            QueryOutcome::Failed(message) => {
                ui.colored_label(ui.visuals().error_fg_color, message);
            }
            QueryOutcome::Executed(result) => {
                ui.label(RichText::new(format!("Ran in {:.1} ms", result.elapsed.as_secs_f64() * 1000.0)).weak().small());
                ResultGrid::new(ctx.max_grid_rows()).show(ui, "workbench_grid", &result.dataset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wb_core::WorkbenchSettings;
    use wb_data::UploadedFile;

    async fn session_with_sales() -> (Session, Frame) {
        let mut session = Session::new(WorkbenchSettings::offline());
        let mut csv = String::from("id,amount\n");
        for i in 1..=100 {
            csv.push_str(&format!("{},{}\n", i, i * 2));
        }
        let frame = session
            .handle(Interaction::Upload(vec![UploadedFile::new("sales.csv", "text/csv", csv.into_bytes())]))
            .await;
        (session, frame)
    }

    #[tokio::test]
    async fn test_blank_query_is_idle() {
        let (mut session, _) = session_with_sales().await;
        assert!(QueryOutcome::evaluate(&mut session, "").is_idle());
        assert!(QueryOutcome::evaluate(&mut session, "  \n\t").is_idle());
    }

    #[tokio::test]
    async fn test_result_matches_direct_execution() {
        let (mut session, _) = session_with_sales().await;
        let sql = "select id, amount * 2 as doubled from \"sales.csv\" where id <= 40";
        let direct = session.execute(sql).unwrap();

        let QueryOutcome::Executed(result) = QueryOutcome::evaluate(&mut session, sql) else {
            panic!("expected a result");
        };
        assert_eq!(result.num_rows(), direct.num_rows());
        assert_eq!(result.num_columns(), direct.num_columns());
        assert_eq!((result.num_rows(), result.num_columns()), (40, 2));
    }

    #[tokio::test]
    async fn test_invalid_query_fails_inline() {
        let (mut session, _) = session_with_sales().await;
        let QueryOutcome::Failed(message) = QueryOutcome::evaluate(&mut session, "select * from nonexistent") else {
            panic!("expected a failure");
        };
        assert!(message.to_lowercase().contains("nonexistent"));

        let frame = session.handle(Interaction::Refresh).await;
        assert_eq!(frame.tables, vec!["sales.csv".to_string()]);
        assert_eq!(frame.active.as_deref(), Some("sales.csv"));
    }

    #[tokio::test]
    async fn test_view_runs_preview_once_per_cycle() {
        let (mut session, frame) = session_with_sales().await;
        let mut view = WorkbenchView::new();

        view.sync(&mut session, &frame);
        assert_eq!(view.buffer(), "select * from \"sales.csv\" limit 10;");
        assert!(matches!(view.outcome(), QueryOutcome::Executed(r) if r.num_rows() == 10));

        // edits stay local until submitted
        view.buffer = "select count(*) from \"sales.csv\"".to_string();
        view.sync(&mut session, &frame);
        assert_eq!(view.buffer(), "select count(*) from \"sales.csv\"");

        let Interaction::EditQuery(sql) = view.submit() else { panic!("expected a query edit") };
        let frame = session.handle(Interaction::EditQuery(sql)).await;
        view.sync(&mut session, &frame);
        assert!(matches!(view.outcome(), QueryOutcome::Executed(r) if r.num_rows() == 1));
    }

    #[tokio::test]
    async fn test_draft_survives_unrelated_cycles() {
        let (mut session, frame) = session_with_sales().await;
        let mut view = WorkbenchView::new();
        view.sync(&mut session, &frame);

        view.buffer = "select max(id) from \"sales.csv\"".to_string();
        let frame = session
            .handle(Interaction::Upload(vec![UploadedFile::new("other.csv", "text/csv", b"x\n1\n".to_vec())]))
            .await;
        view.sync(&mut session, &frame);
        assert_eq!(view.buffer(), "select max(id) from \"sales.csv\"");
        // the submitted preview still drives the result
        assert!(matches!(view.outcome(), QueryOutcome::Executed(r) if r.num_rows() == 10));

        // a new active table reseeds the editor
        let frame = session.handle(Interaction::SelectTable("other.csv".to_string())).await;
        view.sync(&mut session, &frame);
        assert_eq!(view.buffer(), "select * from \"other.csv\" limit 10;");
        assert!(matches!(view.outcome(), QueryOutcome::Executed(r) if r.num_rows() == 1));
    }

    #[tokio::test]
    async fn test_cleared_buffer_shows_prompt() {
        let (mut session, _) = session_with_sales().await;
        let mut view = WorkbenchView::new();
        let frame = session.handle(Interaction::EditQuery(String::new())).await;
        view.sync(&mut session, &frame);
        assert!(view.outcome().is_idle());
    }
}
