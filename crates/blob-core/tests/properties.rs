// Property tests over the pure engine pieces.

mod common;

use blob_core::*;
use common::RecordingRenderer;
use glam::Vec3;
use proptest::prelude::*;

fn any_patch() -> impl Strategy<Value = StatePatch> {
    let field = || proptest::option::of(proptest::num::f32::ANY);
    (field(), field(), field(), field(), field(), field()).prop_map(|(a, v, s, l, d, i)| StatePatch {
        arousal: a,
        valence: v,
        stability: s,
        load: l,
        social_drain: d,
        intensity: i,
    })
}

fn unit_state() -> impl Strategy<Value = StateVector> {
    proptest::array::uniform6(0.0f32..=1.0).prop_map(StateVector::from_array)
}

fn any_mode() -> impl Strategy<Value = InteractionMode> {
    prop_oneof![
        Just(InteractionMode::Follow),
        Just(InteractionMode::Repel),
        Just(InteractionMode::Vortex),
        Just(InteractionMode::Off),
    ]
}

fn in_unit_range(s: StateVector) -> bool {
    s.to_array().iter().all(|v| (0.0..=1.0).contains(v))
}

proptest! {
    #[test]
    fn patches_and_presets_stay_in_unit_range(
        patches in proptest::collection::vec(any_patch(), 1..8),
        preset_idx in 0usize..6,
        intensity in proptest::option::of(proptest::num::f32::ANY),
        dts in proptest::collection::vec(0.0f32..0.2, 1..10),
    ) {
        let mut m = StateModel::new(&EngineContext::default());
        for p in &patches {
            m.set_state(p, 0.0);
            prop_assert!(in_unit_range(m.state()));
            m.set_state(p, 300.0);
            for dt in &dts {
                prop_assert!(in_unit_range(m.advance(*dt)));
            }
        }
        m.set_preset(Preset::ALL[preset_idx], intensity, 0.0);
        prop_assert!(in_unit_range(m.state()));
    }

    #[test]
    fn transition_samples_are_exact_lerps(
        start in unit_state(),
        end in unit_state(),
        duration in 1.0f32..5000.0,
        frac in 0.0f32..1.5,
    ) {
        let mut tr = Transition::new(start, end, duration);
        prop_assert_eq!(tr.sample(), start);
        tr.elapsed_ms = (frac * duration).min(duration);
        let t = (tr.elapsed_ms / duration).clamp(0.0, 1.0);
        let expected = if t >= 1.0 { end } else { StateVector::lerp(start, end, t) };
        prop_assert_eq!(tr.sample(), expected);
        tr.elapsed_ms = duration;
        prop_assert_eq!(tr.sample(), end);
    }

    #[test]
    fn dead_zone_target_is_exactly_zero(
        dead_ratio in 0.01f32..0.95,
        base_radius in 0.1f32..200.0,
        frac in 0.0f32..0.99,
        angle in 0.0f32..std::f32::consts::TAU,
        z in -1.0f32..1.0,
        pressed in any::<bool>(),
        mode in any_mode(),
    ) {
        let mut cfg = InteractionConfig::default();
        prop_assert!(cfg.set(ConfigKey::DeadZoneRatio, dead_ratio));
        let d = PointerDeformer::with_base_radius(base_radius);
        let dir = Vec3::new(angle.cos(), angle.sin(), z).normalize();
        let pointer = dir * (frac * dead_ratio * base_radius);
        let (target, gate) = d.target_offset(Some(pointer), pressed, mode, &cfg);
        prop_assert_eq!(gate, 0.0);
        prop_assert_eq!(target, Vec3::ZERO);
    }

    #[test]
    fn offset_never_exceeds_max_offset(
        steps in proptest::collection::vec(
            (
                -0.01f32..0.2,
                proptest::option::of((-4.0f32..4.0, -4.0f32..4.0, -1.0f32..1.0)),
                any::<bool>(),
                any_mode(),
                proptest::option::of((0usize..16, -10.0f32..100.0)),
            ),
            1..200,
        ),
    ) {
        let mut cfg = InteractionConfig::default();
        let mut d = PointerDeformer::with_base_radius(0.8);
        let numeric: Vec<ConfigKey> = ConfigKey::ALL
            .iter()
            .copied()
            .filter(|k| cfg.get(*k).is_some())
            .collect();
        for (dt, pointer, pressed, mode, change) in steps {
            if let Some((idx, value)) = change {
                cfg.set(numeric[idx % numeric.len()], value);
            }
            let p = pointer.map(|(x, y, z)| Vec3::new(x, y, z));
            let out = d.update(dt, p, pressed, mode, &cfg);
            prop_assert!(out.offset.length() <= cfg.max_offset + 1e-5);
            prop_assert!(out.offset.is_finite());
            prop_assert!(out.detail_amount <= 0.2);
            prop_assert!((out.direction.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn mapper_is_pure(a in unit_state(), b in unit_state()) {
        let first = map_state_to_visual(&a);
        let _ = map_state_to_visual(&b);
        let second = map_state_to_visual(&a);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ladder_never_climbs_back(dts in proptest::collection::vec(0.001f32..0.08, 1..400)) {
        let mut gov = RenderGovernor::from_context(&EngineContext::default());
        gov.start(Ok(RecordingRenderer::new().0));
        let mut tier = gov.ladder().tier();
        let mut glow_disabled = gov.ladder().glow_disabled();
        for dt in dts {
            gov.tick(dt);
            prop_assert!(gov.ladder().tier() >= tier);
            prop_assert!(gov.ladder().glow_disabled() || !glow_disabled);
            tier = gov.ladder().tier();
            glow_disabled = gov.ladder().glow_disabled();
        }
    }

    #[test]
    fn unlisted_config_key_changes_nothing(
        key in "[a-zA-Z.]{0,24}",
        value in proptest::num::f32::ANY,
    ) {
        prop_assume!(ConfigKey::from_name(&key).is_none());
        let mut m = StateModel::new(&EngineContext::default());
        m.set_preset(Preset::Anxious, None, 400.0);
        let before = (m.state(), *m.interaction(), m.overrides(), m.transition().copied(), m.mode());
        prop_assert!(!m.apply_config_override(&key, value));
        prop_assert!(!m.apply_config_override(&key, true));
        let after = (m.state(), *m.interaction(), m.overrides(), m.transition().copied(), m.mode());
        prop_assert_eq!(before, after);
    }
}
