// Frame governor driven with synthetic dt values.

mod common;

use blob_core::constants::*;
use blob_core::*;
use common::RecordingRenderer;
use std::cell::RefCell;
use std::rc::Rc;

const SLOW_DT: f32 = 0.05; // 20 fps
const FAST_DT: f32 = 1.0 / 120.0;

fn governor() -> RenderGovernor<RecordingRenderer> {
    RenderGovernor::from_context(&EngineContext::default())
}

fn capture_notices(gov: &mut RenderGovernor<RecordingRenderer>) -> Rc<RefCell<Vec<DegradeNotice>>> {
    let notices = Rc::new(RefCell::new(Vec::new()));
    let sink = notices.clone();
    gov.on_degrade(move |n| sink.borrow_mut().push(n.clone()));
    notices
}

#[test]
fn init_failure_never_enters_the_loop() {
    let mut gov = governor();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();
    gov.on_error(move |e| sink.borrow_mut().push(e.clone()));

    assert!(!gov.start(Err(RenderError::Init("no adapter".into()))));
    assert_eq!(gov.status(), LoopStatus::Halted);
    assert_eq!(*errors.borrow(), vec![RenderError::Init("no adapter".into())]);
    assert!(gov.tick(0.016).is_none());
}

#[test]
fn idle_governor_does_not_tick() {
    let mut gov = governor();
    assert_eq!(gov.status(), LoopStatus::Idle);
    assert!(gov.tick(0.016).is_none());
}

#[test]
fn draw_failure_halts_ticks() {
    let mut gov = governor();
    let errors = Rc::new(RefCell::new(0));
    let sink = errors.clone();
    gov.on_error(move |_| *sink.borrow_mut() += 1);
    let (renderer, log) = RecordingRenderer::failing_on(3);
    assert!(gov.start(Ok(renderer)));

    assert!(gov.tick(0.016).is_some());
    assert!(gov.tick(0.016).is_some());
    assert!(gov.tick(0.016).is_none());
    assert_eq!(gov.status(), LoopStatus::Halted);
    assert!(gov.tick(0.016).is_none());
    assert_eq!(log.borrow().frames.len(), 2);
    assert_eq!(*errors.borrow(), 1);

    let (fresh, fresh_log) = RecordingRenderer::new();
    assert!(gov.start(Ok(fresh)));
    assert!(gov.tick(0.016).is_some());
    assert_eq!(fresh_log.borrow().frames.len(), 1);
}

#[test]
fn stop_discards_transition_and_releases_renderer() {
    let mut gov = governor();
    let (renderer, log) = RecordingRenderer::new();
    gov.start(Ok(renderer));
    gov.model_mut().set_preset(Preset::Angry, None, 1000.0);
    gov.tick(0.016);
    assert!(gov.model().transition().is_some());

    let frozen = gov.model().state();
    gov.stop();
    assert_eq!(gov.status(), LoopStatus::Stopped);
    assert!(gov.model().transition().is_none());
    assert_eq!(gov.model().state(), frozen);
    assert!(log.borrow().released);
    assert!(gov.tick(0.016).is_none());
}

#[test]
fn glow_goes_before_tier_one_step_per_breach() {
    let mut gov = governor();
    let notices = capture_notices(&mut gov);
    gov.start(Ok(RecordingRenderer::new().0));
    let window = EngineContext::default().settings.governor.fps_window;

    for _ in 0..window - 1 {
        gov.tick(SLOW_DT);
    }
    assert!(notices.borrow().is_empty());
    gov.tick(SLOW_DT);
    assert_eq!(notices.borrow().len(), 1);
    assert_eq!(notices.borrow()[0].step, DegradeStep::DisableGlow);
    assert_eq!(gov.ladder().tier(), FidelityTier::Full);
    assert!(!gov.glow_enabled());
    assert!(gov.fps_window().is_empty());

    for _ in 0..window - 1 {
        gov.tick(SLOW_DT);
    }
    assert_eq!(notices.borrow().len(), 1);
    gov.tick(SLOW_DT);
    assert_eq!(notices.borrow().len(), 2);
    assert_eq!(notices.borrow()[1].step, DegradeStep::ReduceToMid);
    assert_eq!(notices.borrow()[1].tier, FidelityTier::Mid);

    for _ in 0..window {
        gov.tick(SLOW_DT);
    }
    assert_eq!(notices.borrow()[2].step, DegradeStep::ReduceToFallback);

    for _ in 0..window * 3 {
        gov.tick(SLOW_DT);
    }
    assert_eq!(notices.borrow().len(), 3);
    assert!(notices.borrow()[2].message.contains("600"));
}

#[test]
fn glow_step_is_skipped_when_glow_already_off() {
    let mut gov = governor();
    let notices = capture_notices(&mut gov);
    gov.start(Ok(RecordingRenderer::new().0));
    assert!(gov.model_mut().apply_config_override("cloud.enableBloom", false));

    for _ in 0..FPS_WINDOW {
        gov.tick(SLOW_DT);
    }
    assert_eq!(notices.borrow().len(), 1);
    assert_eq!(notices.borrow()[0].step, DegradeStep::ReduceToMid);
    assert!(!gov.ladder().glow_disabled());
}

#[test]
fn degraded_tier_survives_recovery_and_bloom_toggle() {
    let mut gov = governor();
    gov.start(Ok(RecordingRenderer::new().0));
    for _ in 0..FPS_WINDOW * 2 {
        gov.tick(SLOW_DT);
    }
    assert_eq!(gov.ladder().tier(), FidelityTier::Mid);

    gov.model_mut().toggle_bloom();
    gov.model_mut().toggle_bloom();
    assert!(gov.model().overrides().bloom_enabled);
    for _ in 0..FPS_WINDOW * 4 {
        let snap = gov.tick(FAST_DT).expect("frame");
        assert!(!snap.glow_enabled);
        assert_eq!(snap.tier, FidelityTier::Mid);
    }
}

#[test]
fn fast_frames_never_degrade() {
    let mut gov = governor();
    let notices = capture_notices(&mut gov);
    let fps = Rc::new(RefCell::new(Vec::new()));
    let sink = fps.clone();
    gov.on_fps(move |avg| sink.borrow_mut().push(avg));
    gov.start(Ok(RecordingRenderer::new().0));
    for _ in 0..FPS_WINDOW * 3 {
        gov.tick(FAST_DT);
    }
    assert!(notices.borrow().is_empty());
    assert_eq!(fps.borrow().len(), FPS_WINDOW * 3);
    assert!(fps.borrow().iter().all(|f| (f - 120.0).abs() < 0.5));
}

#[test]
fn paused_frames_skip_draw_and_fps() {
    let mut gov = governor();
    let (renderer, log) = RecordingRenderer::new();
    gov.start(Ok(renderer));
    gov.model_mut().set_preset(Preset::Happy, None, 200.0);
    gov.model_mut().set_paused(true);

    let snap = gov.tick(0.1).expect("paused snapshot");
    assert!(snap.paused);
    assert!(log.borrow().frames.is_empty());
    assert!(gov.fps_window().is_empty());
    // State transitions keep advancing while paused.
    gov.tick(0.05);
    gov.tick(0.05);
    gov.tick(0.05);
    assert_eq!(gov.model().state(), Preset::Happy.state());
}

#[test]
fn dt_is_clamped_after_stalls() {
    let mut gov = governor();
    gov.start(Ok(RecordingRenderer::new().0));
    gov.model_mut().set_preset(Preset::Sad, None, 1000.0);
    gov.tick(5.0);
    let tr = gov.model().transition().copied().expect("still running");
    assert_eq!(tr.elapsed_ms, 50.0);
    let snap = gov.tick(f32::NAN).expect("frame");
    assert_eq!(snap.elapsed_sec, 0.05);
}

#[test]
fn snapshot_carries_overrides_and_element_count() {
    let mut gov = governor();
    let (renderer, log) = RecordingRenderer::new();
    gov.start(Ok(renderer));
    assert!(gov.model_mut().apply_config_override("cloud.pointSize", 4.5_f32));
    let snap = gov.tick(0.016).expect("frame");
    assert_eq!(snap.visual.point_size, 4.5);
    assert_eq!(snap.element_count, gov.element_count(snap.visual.density));
    assert!(snap.element_count <= FULL_ELEMENT_COUNT);
    assert!(snap.element_count >= (FULL_ELEMENT_COUNT as f32 * ELEMENT_DENSITY_FLOOR) as u32);
    assert_eq!(log.borrow().frames[0], snap);
}

#[test]
fn resize_forwards_capped_viewport() {
    let mut gov = governor();
    let (renderer, log) = RecordingRenderer::new();
    gov.start(Ok(renderer));
    gov.model_mut().set_preset(Preset::Angry, None, 2000.0);
    gov.set_pointer_world(glam::Vec3::new(1.2, 0.0, 0.0));
    for _ in 0..20 {
        gov.tick(0.016);
    }
    let offset = gov.deformer().offset();
    let velocity = gov.deformer().velocity();
    let state = gov.model().state();
    let transition = gov.model().transition().copied();
    assert!(offset.length() > 0.0);

    gov.resize(Viewport::new(400.0, 200.0, 3.0));
    let last = *log.borrow().resizes.last().expect("resize");
    assert_eq!(last.pixel_ratio, 2.0);
    assert_eq!(gov.camera().aspect, 2.0);
    assert_eq!(gov.deformer().offset(), offset);
    assert_eq!(gov.deformer().velocity(), velocity);
    assert_eq!(gov.model().state(), state);
    assert_eq!(gov.model().transition().copied(), transition);
}

#[test]
fn lowering_max_offset_while_paused_clamps_held_frame() {
    let mut gov = governor();
    gov.start(Ok(RecordingRenderer::new().0));
    gov.set_pointer_world(glam::Vec3::new(1.2, 0.0, 0.0));
    for _ in 0..120 {
        gov.tick(0.016);
    }
    assert!(gov.deformer().offset().length() > 0.1);

    gov.model_mut().set_paused(true);
    assert!(gov.model_mut().apply_config_override("interaction.maxOffset", 0.0_f32));
    let snap = gov.tick(0.016).expect("paused frame");
    assert!(snap.paused);
    assert!(snap.deformation.offset.length() <= snap.interaction.max_offset);
    assert_eq!(gov.deformer().offset(), glam::Vec3::ZERO);
}

#[test]
fn elapsed_time_stays_precise_over_long_sessions() {
    let mut gov = governor();
    gov.start(Ok(RecordingRenderer::new().0));
    gov.model_mut().set_paused(true);
    let mut last = None;
    for _ in 0..36_000 {
        last = gov.tick(FAST_DT);
    }
    let elapsed = last.expect("frame").elapsed_sec;
    assert!((elapsed - 36_000.0 * FAST_DT).abs() < 1e-3, "{elapsed}");
}

#[test]
fn nan_fps_threshold_falls_back_to_default() {
    let settings = EngineSettings::from_toml_str("[governor]\nfps_threshold = nan\n").expect("toml");
    assert_eq!(settings.governor.fps_threshold, DEGRADE_FPS_THRESHOLD);
    let mut gov: RenderGovernor<RecordingRenderer> = RenderGovernor::from_context(&EngineContext::new(settings));
    gov.start(Ok(RecordingRenderer::new().0));
    for _ in 0..90 {
        gov.tick(FAST_DT);
    }
    assert_eq!(gov.ladder().tier(), FidelityTier::Full);
    assert!(!gov.ladder().glow_disabled());
}

#[test]
fn screen_pointer_projects_to_plane() {
    let mut gov = governor();
    gov.start(Ok(RecordingRenderer::new().0));
    gov.resize(Viewport::new(800.0, 600.0, 1.0));
    gov.set_pointer_screen(400.0, 300.0);
    let p = gov.pointer().expect("pointer");
    assert!(p.length() < 1e-4);

    // Pointer dead-center sits in the dead zone: nothing moves.
    for _ in 0..30 {
        gov.tick(0.016);
    }
    assert_eq!(gov.deformer().offset(), glam::Vec3::ZERO);

    gov.set_pointer_screen(700.0, 300.0);
    for _ in 0..30 {
        gov.tick(0.016);
    }
    assert!(gov.deformer().offset().x > 0.0);

    gov.clear_pointer();
    assert!(gov.pointer().is_none());
}

#[test]
fn rejected_control_leaves_model_untouched() {
    let mut gov = governor();
    let before = (gov.model().state(), *gov.model().interaction(), gov.model().overrides());
    for raw in [
        "{",
        r#"{"type":"setPreset","payload":{"name":"elated"}}"#,
        r#"{"type":"setConfig","payload":{"key":"renderer.backend","value":1}}"#,
        r#"{"type":"setConfig","payload":{"key":"interaction.damping","value":"high"}}"#,
    ] {
        assert!(gov.apply_control_json(raw).is_err(), "{raw}");
    }
    let after = (gov.model().state(), *gov.model().interaction(), gov.model().overrides());
    assert_eq!(before, after);
}
