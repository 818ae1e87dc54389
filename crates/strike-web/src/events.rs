//! Keyboard glue standing in for the campaign's gameplay systems: each key
//! feeds the same signals level scripts and combat code send in the full game.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::frame::FrameContext;
use strike_core::config::QualityTier;
use strike_core::grade::LevelType;
use strike_core::music::{CombatIntensity, MusicState};

pub fn attach_keyboard(document: &web::Document, ctx: Rc<RefCell<FrameContext>>) {
    let down_ctx = ctx.clone();
    let on_down = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        let mut ctx = down_ctx.borrow_mut();
        match ev.code().as_str() {
            // Music states
            "Digit1" => ctx.director.play(MusicState::Silent),
            "Digit2" => ctx.director.play(MusicState::Menu),
            "Digit3" => ctx.director.play(MusicState::Exploration),
            "Digit4" => ctx.director.play(MusicState::Combat),
            "Digit5" => ctx.director.play(MusicState::Boss),
            "KeyI" => {
                let next = match ctx.director.intensity() {
                    CombatIntensity::Low => CombatIntensity::Medium,
                    CombatIntensity::Medium => CombatIntensity::High,
                    CombatIntensity::High => CombatIntensity::Low,
                };
                ctx.director.set_combat_intensity(next);
            }
            "KeyV" => ctx.director.play_victory_stinger(),
            "KeyM" => ctx.director.duck(0.3, 0.4),
            "KeyN" => ctx.director.unduck(0.4),

            // Combat feedback
            "KeyH" => ctx.manager.trigger_damage_flash(0.8),
            "KeyJ" => ctx.manager.trigger_hit_confirmation(),
            "KeyK" => ctx.manager.trigger_explosion_bloom(1.2, 0.6),
            "KeyL" => {
                ctx.manager.trigger_weapon_shake(0.7, 220.0);
                ctx.manager.trigger_fov_punch(3.5, 140.0);
            }
            "KeyC" => {
                let in_combat = matches!(
                    ctx.director.state(),
                    MusicState::Combat | MusicState::Boss
                );
                ctx.manager.set_combat_state(!in_combat);
            }
            "KeyP" => ctx.manager.set_player_health(0.15),
            "KeyO" => ctx.manager.set_player_health(1.0),

            // Movement flags
            "ShiftLeft" => ctx.manager.set_sprinting(true),
            "KeyF" => ctx.manager.set_aiming(true),
            "KeyX" => ctx.manager.set_sliding(true),

            // Quality / level looks
            "Digit6" => ctx.manager.set_quality(QualityTier::Low),
            "Digit7" => ctx.manager.set_quality(QualityTier::Medium),
            "Digit8" => ctx.manager.set_quality(QualityTier::High),
            "Digit9" => ctx.manager.set_quality(QualityTier::Ultra),
            "KeyG" => ctx.manager.transition_to_level_type(LevelType::Hive, 1500.0),
            "KeyT" => ctx.manager.transition_to_level_type(LevelType::Station, 1500.0),
            "KeyY" => ctx.manager.transition_to_level_type(LevelType::Extraction, 1500.0),
            "Space" => ctx.paused = !ctx.paused,
            _ => {}
        }
    }) as Box<dyn FnMut(web::KeyboardEvent)>);
    document
        .add_event_listener_with_callback("keydown", on_down.as_ref().unchecked_ref())
        .ok();
    on_down.forget();

    let up_ctx = ctx;
    let on_up = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        let mut ctx = up_ctx.borrow_mut();
        match ev.code().as_str() {
            "ShiftLeft" => ctx.manager.set_sprinting(false),
            "KeyF" => ctx.manager.set_aiming(false),
            "KeyX" => ctx.manager.set_sliding(false),
            _ => {}
        }
    }) as Box<dyn FnMut(web::KeyboardEvent)>);
    document
        .add_event_listener_with_callback("keyup", on_up.as_ref().unchecked_ref())
        .ok();
    on_up.forget();
}
