//! WebAudio implementation of the core `AudioBackend` contract.
//!
//! The director only sees opaque gain/instrument handles; everything here is
//! plain web-sys node plumbing. Notes are rendered as envelope-shaped
//! oscillator one-shots scheduled on AudioContext time, so nothing holds a
//! long-lived source node besides the per-handle gains.

use fnv::FnvHashMap;
use strike_core::audio::{AudioBackend, GainId, InstrumentId, InstrumentKind};
use strike_core::sequence::NoteEvent;
use web_sys as web;

fn create_gain_node(ctx: &web::AudioContext, value: f32, label: &str) -> Option<web::GainNode> {
    match web::GainNode::new(ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Some(g)
        }
        Err(e) => {
            log::error!("{} GainNode error: {:?}", label, e);
            None
        }
    }
}

struct Instrument {
    kind: InstrumentKind,
    output: u32,
}

pub struct WebAudioBackend {
    ctx: web::AudioContext,
    /// Bus every parentless gain feeds; sits in front of the delay send.
    bus: web::GainNode,
    delay_in: web::GainNode,
    delay: web::DelayNode,
    gains: FnvHashMap<u32, web::GainNode>,
    instruments: FnvHashMap<u32, Instrument>,
    next_id: u32,
    bpm: f32,
    transport_running: bool,
}

impl WebAudioBackend {
    pub fn new(ctx: web::AudioContext) -> Result<Self, ()> {
        let bus = create_gain_node(&ctx, 1.0, "bus").ok_or(())?;
        let _ = bus.connect_with_audio_node(&ctx.destination());

        // Tempo-synced slap delay with a dark feedback loop, fed from the bus.
        let delay_in = create_gain_node(&ctx, 0.25, "delay in").ok_or(())?;
        let delay = ctx.create_delay_with_max_delay_time(2.0).map_err(|e| {
            log::error!("DelayNode error: {:?}", e);
        })?;
        delay.delay_time().set_value(0.34);
        let delay_tone = web::BiquadFilterNode::new(&ctx).map_err(|e| {
            log::error!("BiquadFilterNode error: {:?}", e);
        })?;
        delay_tone.set_type(web::BiquadFilterType::Lowpass);
        delay_tone.frequency().set_value(1600.0);
        let delay_feedback = create_gain_node(&ctx, 0.35, "delay feedback").ok_or(())?;
        let _ = bus.connect_with_audio_node(&delay_in);
        let _ = delay_in.connect_with_audio_node(&delay);
        let _ = delay.connect_with_audio_node(&delay_tone);
        let _ = delay_tone.connect_with_audio_node(&delay_feedback);
        let _ = delay_feedback.connect_with_audio_node(&delay);
        let _ = delay_tone.connect_with_audio_node(&ctx.destination());

        Ok(Self {
            ctx,
            bus,
            delay_in,
            delay,
            gains: FnvHashMap::default(),
            instruments: FnvHashMap::default(),
            next_id: 0,
            bpm: 110.0,
            transport_running: false,
        })
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// One envelope-shaped oscillator, started and stopped on context time.
    fn one_shot(
        &self,
        osc_type: web::OscillatorType,
        frequency_hz: f32,
        freq_end_hz: Option<f32>,
        velocity: f32,
        attack: f64,
        start: f64,
        duration: f64,
        out: &web::GainNode,
    ) {
        let Ok(src) = web::OscillatorNode::new(&self.ctx) else {
            return;
        };
        src.set_type(osc_type);
        src.frequency().set_value(frequency_hz);
        let t0 = start.max(self.ctx.current_time());
        if let Some(end) = freq_end_hz {
            let _ = src
                .frequency()
                .exponential_ramp_to_value_at_time(end.max(1.0), t0 + duration);
        }
        if let Ok(env) = web::GainNode::new(&self.ctx) {
            env.gain().set_value(0.0);
            let _ = env
                .gain()
                .linear_ramp_to_value_at_time(velocity, t0 + attack);
            let _ = env.gain().linear_ramp_to_value_at_time(0.0, t0 + duration);
            let _ = src.connect_with_audio_node(&env);
            let _ = env.connect_with_audio_node(out);
            let _ = src.start_with_when(t0);
            let _ = src.stop_with_when(t0 + duration + 0.05);
        }
    }
}

impl AudioBackend for WebAudioBackend {
    fn now(&self) -> f64 {
        self.ctx.current_time()
    }

    fn create_gain(&mut self, initial: f32, parent: Option<GainId>) -> GainId {
        let id = self.alloc();
        if let Some(g) = create_gain_node(&self.ctx, initial, "gain") {
            let target: &web::AudioNode = match parent.and_then(|p| self.gains.get(&p.0)) {
                Some(parent_gain) => parent_gain,
                None => &self.bus,
            };
            let _ = g.connect_with_audio_node(target);
            self.gains.insert(id, g);
        }
        GainId(id)
    }

    fn ramp_gain(&mut self, gain: GainId, target: f32, seconds: f32) {
        if let Some(g) = self.gains.get(&gain.0) {
            let now = self.ctx.current_time();
            if seconds <= 0.0 {
                g.gain().set_value(target);
            } else {
                // Anchor the ramp at the current value so overlapping ramps
                // pick up where the previous one left off.
                let _ = g.gain().set_value_at_time(g.gain().value(), now);
                let _ = g
                    .gain()
                    .linear_ramp_to_value_at_time(target, now + seconds as f64);
            }
        }
    }

    fn dispose_gain(&mut self, gain: GainId) {
        if let Some(g) = self.gains.remove(&gain.0) {
            let _ = g.disconnect();
        }
    }

    fn build_instrument(&mut self, kind: InstrumentKind, output: GainId) -> InstrumentId {
        let id = self.alloc();
        self.instruments.insert(
            id,
            Instrument {
                kind,
                output: output.0,
            },
        );
        InstrumentId(id)
    }

    fn dispose_instrument(&mut self, instrument: InstrumentId) {
        // One-shots self-terminate; dropping the routing entry is enough.
        self.instruments.remove(&instrument.0);
    }

    fn note_on(&mut self, instrument: InstrumentId, event: &NoteEvent) {
        let Some(inst) = self.instruments.get(&instrument.0) else {
            return;
        };
        let Some(out) = self.gains.get(&inst.output) else {
            return;
        };
        let out = out.clone();
        let start = event.start_time_sec;
        let dur = event.duration_sec as f64;
        let vel = event.velocity;
        let f = event.frequency_hz;
        match inst.kind {
            InstrumentKind::Pad => {
                // Two detuned saws with a slow swell.
                self.one_shot(web::OscillatorType::Sawtooth, f, None, vel * 0.5, 0.6, start, dur, &out);
                self.one_shot(
                    web::OscillatorType::Sawtooth,
                    f * 1.007,
                    None,
                    vel * 0.5,
                    0.8,
                    start,
                    dur,
                    &out,
                );
            }
            InstrumentKind::Arp => {
                self.one_shot(web::OscillatorType::Triangle, f, None, vel, 0.01, start, dur, &out);
            }
            InstrumentKind::Percussion => {
                // Pitched-down sine thump.
                self.one_shot(
                    web::OscillatorType::Sine,
                    f.max(100.0),
                    Some(45.0),
                    vel,
                    0.003,
                    start,
                    (dur).min(0.25),
                    &out,
                );
            }
            InstrumentKind::Bass => {
                self.one_shot(web::OscillatorType::Square, f, None, vel * 0.8, 0.01, start, dur, &out);
            }
            InstrumentKind::Stabs => {
                self.one_shot(web::OscillatorType::Sawtooth, f, None, vel * 0.7, 0.005, start, dur, &out);
            }
            InstrumentKind::Lead | InstrumentKind::Stinger => {
                self.one_shot(web::OscillatorType::Square, f, None, vel * 0.6, 0.01, start, dur, &out);
                self.one_shot(
                    web::OscillatorType::Square,
                    f * 2.0,
                    None,
                    vel * 0.2,
                    0.01,
                    start,
                    dur,
                    &out,
                );
            }
        }
    }

    fn start_transport(&mut self) {
        self.transport_running = true;
        self.delay_in.gain().set_value(0.25);
    }

    fn stop_transport(&mut self) {
        self.transport_running = false;
        self.delay_in.gain().set_value(0.0);
    }

    fn ramp_transport_bpm(&mut self, bpm: f32, seconds: f32) {
        self.bpm = bpm.max(1.0);
        // Keep the slap delay on the dotted eighth of the new tempo.
        let beat = 60.0 / self.bpm;
        let now = self.ctx.current_time();
        let _ = self
            .delay
            .delay_time()
            .linear_ramp_to_value_at_time(beat * 0.75, now + seconds.max(0.01) as f64);
    }
}
