// Host-side tests for the declarative pipeline configuration.

use strike_core::config::*;

#[test]
fn bloom_weight_formula_is_exact() {
    assert!((bloom_weight(0.0) - 0.1).abs() < 0.001);
    assert!((bloom_weight(0.5) - 0.35).abs() < 0.001);
    assert!((bloom_weight(1.0) - 0.6).abs() < 0.001);
}

#[test]
fn film_grain_formula_is_exact() {
    assert!((film_grain_amount(0.0) - 0.05).abs() < 0.001);
    assert!((film_grain_amount(0.5) - 0.175).abs() < 0.001);
    assert!((film_grain_amount(1.0) - 0.3).abs() < 0.001);
}

#[test]
fn mapping_formulas_clamp_out_of_range_intensity() {
    assert!((bloom_weight(-3.0) - bloom_weight(0.0)).abs() < 1e-6);
    assert!((bloom_weight(7.0) - bloom_weight(1.0)).abs() < 1e-6);
    assert!((film_grain_amount(-1.0) - film_grain_amount(0.0)).abs() < 1e-6);
    assert!((film_grain_amount(2.0) - film_grain_amount(1.0)).abs() < 1e-6);
}

#[test]
fn quality_preset_table_matches_contract() {
    let low = preset_for(QualityTier::Low);
    assert!(!low.film_grain);
    assert!(!low.chromatic_aberration);
    assert!(!low.bloom);
    assert!(!low.motion_blur);
    assert!(!low.depth_of_field);

    let medium = preset_for(QualityTier::Medium);
    assert!(medium.film_grain);
    assert!(medium.chromatic_aberration);
    assert!(medium.bloom);
    assert!(!medium.motion_blur);
    assert!(!medium.depth_of_field);

    let high = preset_for(QualityTier::High);
    assert!(high.motion_blur);
    assert!(!high.depth_of_field);

    let ultra = preset_for(QualityTier::Ultra);
    assert!(ultra.film_grain);
    assert!(ultra.chromatic_aberration);
    assert!(ultra.bloom);
    assert!(ultra.motion_blur);
    assert!(ultra.depth_of_field);
}

#[test]
fn quality_tier_parse_accepts_known_tags_only() {
    assert_eq!(QualityTier::parse("low"), Some(QualityTier::Low));
    assert_eq!(QualityTier::parse("ultra"), Some(QualityTier::Ultra));
    assert_eq!(QualityTier::parse("extreme"), None);
    assert_eq!(QualityTier::parse(""), None);
}

#[test]
fn low_tier_forces_optional_effects_off_despite_overrides() {
    let mut cfg = PipelineConfig::new(
        QualityTier::Low,
        &SettingsPatch {
            film_grain_enabled: Some(true),
            chromatic_aberration_enabled: Some(true),
            ..SettingsPatch::default()
        },
    );
    let toggles = cfg.resolved();
    assert!(!toggles.film_grain, "low tier must gate grain off");
    assert!(!toggles.chromatic_aberration);

    // The overrides survive the gate: raising the tier re-applies them.
    cfg.set_quality(QualityTier::Ultra);
    let toggles = cfg.resolved();
    assert!(toggles.film_grain);
    assert!(toggles.chromatic_aberration);
}

#[test]
fn explicit_disable_override_is_retained_across_tier_changes() {
    let mut cfg = PipelineConfig::new(
        QualityTier::Low,
        &SettingsPatch {
            bloom_enabled: Some(false),
            ..SettingsPatch::default()
        },
    );
    assert!(!cfg.resolved().film_grain, "from the low preset");
    assert!(!cfg.resolved().bloom, "from the explicit override");

    cfg.set_quality(QualityTier::Ultra);
    assert!(!cfg.resolved().bloom, "override must outlive the preset change");
    assert!(cfg.resolved().film_grain);
}

#[test]
fn master_kill_switch_forces_every_toggle_off() {
    let mut cfg = PipelineConfig::new(QualityTier::Ultra, &SettingsPatch::default());
    assert!(cfg.resolved().any());

    cfg.apply_settings(&SettingsPatch {
        post_processing_enabled: Some(false),
        ..SettingsPatch::default()
    });
    let toggles = cfg.resolved();
    assert!(!toggles.any(), "kill switch must defeat every toggle");
    assert!(!toggles.bloom);
    assert!(!toggles.fxaa);
    assert!(!toggles.image_process);
}

#[test]
fn settings_merge_is_one_way_and_partial() {
    let mut cfg = PipelineConfig::new(QualityTier::High, &SettingsPatch::default());
    cfg.apply_settings(&SettingsPatch {
        bloom_intensity: Some(0.8),
        ..SettingsPatch::default()
    });
    // Keys absent from the patch leave the config untouched.
    assert!(cfg.resolved().film_grain);
    assert!((cfg.bloom_intensity() - 0.8).abs() < 1e-6);
    assert!((cfg.film_grain_intensity() - 0.5).abs() < 1e-6);
}

#[test]
fn settings_intensities_are_clamped() {
    let mut cfg = PipelineConfig::new(QualityTier::High, &SettingsPatch::default());
    cfg.apply_settings(&SettingsPatch {
        bloom_intensity: Some(4.0),
        film_grain_intensity: Some(-2.0),
        ..SettingsPatch::default()
    });
    assert!((cfg.bloom_intensity() - 1.0).abs() < 1e-6);
    assert!((cfg.film_grain_intensity() - 0.0).abs() < 1e-6);
}

#[test]
fn set_quality_reports_membership_change_only() {
    let mut cfg = PipelineConfig::new(QualityTier::Medium, &SettingsPatch::default());
    assert!(!cfg.set_quality(QualityTier::Medium), "same tier is idempotent");
    assert!(cfg.set_quality(QualityTier::High), "medium->high adds motion blur");
}

#[test]
fn depth_of_field_requires_both_request_and_tier() {
    let mut cfg = PipelineConfig::new(QualityTier::High, &SettingsPatch::default());
    cfg.set_depth_of_field_requested(true);
    assert!(!cfg.resolved().depth_of_field, "high tier disallows DoF");

    cfg.set_quality(QualityTier::Ultra);
    assert!(cfg.resolved().depth_of_field);

    cfg.set_depth_of_field_requested(false);
    assert!(!cfg.resolved().depth_of_field);
}
