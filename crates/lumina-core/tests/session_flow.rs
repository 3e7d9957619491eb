//! Session lifecycle across runs

use lumina_core::{
    AnalysisError, ColorDirective, DesignSession, InputError, PipelineError, PipelineResult,
    PipelineStage, ResumePoint, StageKind,
};
use lumina_test_utils::{
    complete_preferences, jpeg_fixture, orchestrator, png_fixture, RecordingCurator,
    ScriptedAnalyzer, ScriptedGenerator,
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn upload_configure_run_and_download() {
    let mut session = DesignSession::new(complete_preferences());
    session.add_images([png_fixture("kitchen"), jpeg_fixture("kitchen-wide")]);
    session.finalize_images().unwrap();

    let pipeline = orchestrator(
        ScriptedAnalyzer::answering("Galley kitchen, window over sink"),
        ScriptedGenerator::new(),
        RecordingCurator::answering("Bright country kitchen.", 5),
    );

    let result = session.run(&pipeline).await.unwrap().unwrap();
    assert_eq!(result.design_concept, "Bright country kitchen.");
    assert_eq!(result.successful_count(), 2);

    let item = &result.shopping_list[0];
    assert!(item
        .search_url()
        .starts_with("https://www.google.com/search?q="));

    let at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let name = PipelineResult::download_file_name(&result.variations[0], at);
    assert!(name.starts_with("lumina-design-"), "{name}");
    assert!(name.ends_with(".png"), "{name}");
}

#[tokio::test]
async fn failure_sends_user_back_to_preferences_with_state_intact() {
    let mut session = DesignSession::new(complete_preferences());
    session.add_images([png_fixture("bedroom")]);
    session.finalize_images().unwrap();
    let rx = session.subscribe();

    let broken = orchestrator(
        ScriptedAnalyzer::failing(AnalysisError::Timeout { duration_secs: 60 }),
        ScriptedGenerator::new(),
        RecordingCurator::answering("unused", 3),
    )
    .with_resume_point(ResumePoint::StylePreferences);

    let err = session.run(&broken).await.unwrap_err();
    assert!(matches!(err, PipelineError::AnalysisFailed(_)));
    assert_eq!(
        *rx.borrow(),
        PipelineStage::Failed {
            stage: StageKind::Analyzing,
            resume_at: ResumePoint::StylePreferences,
        }
    );
    assert_eq!(session.preferences(), &complete_preferences());
    assert_eq!(session.pending_images().len(), 1);

    // The user tweaks colors and retries
    session.preferences_mut().colors = ColorDirective::Palettes(vec!["Pastels".into()]);
    let working = orchestrator(
        ScriptedAnalyzer::answering("Bedroom with bay window"),
        ScriptedGenerator::new(),
        RecordingCurator::answering("Soft pastel retreat.", 3),
    );
    let result = session.run(&working).await.unwrap().unwrap();
    assert_eq!(result.design_concept, "Soft pastel retreat.");
    assert_eq!(*rx.borrow(), PipelineStage::Completed);
}

#[tokio::test]
async fn incomplete_preferences_fail_before_any_call() {
    let mut session = DesignSession::new(complete_preferences().with_colors(ColorDirective::Unset));
    session.add_images([png_fixture("office")]);
    session.finalize_images().unwrap();

    let analyzer = ScriptedAnalyzer::answering("unused");
    let pipeline = orchestrator(
        analyzer.clone(),
        ScriptedGenerator::new(),
        RecordingCurator::answering("unused", 3),
    );

    let err = session.run(&pipeline).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidInput(InputError::IncompletePreferences("colors"))
    ));
    assert_eq!(analyzer.calls(), 0);
    assert_eq!(
        session.stage(),
        PipelineStage::Failed {
            stage: StageKind::Idle,
            resume_at: ResumePoint::StylePreferences,
        }
    );
}
