//! Audio-collaborator seam.
//!
//! The core decides *when* a named sound starts, loops or stops; playback
//! mechanics belong to the host. Sinks must tolerate redundant calls —
//! stopping a sound that never started is a no-op.

/// The closed vocabulary of sounds the simulation can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sound {
    Walking,
    Jump,
    Hurt,
    Snore,
    CoinPickup,
    BottlePickup,
    Throw,
    Splash,
    WalkerDeath,
    BossHurt,
    BossAttack,
    BossDeath,
    Soundtrack,
    BossTheme,
    Win,
    Lose,
}

pub trait AudioSink {
    /// Play a one-shot sound from the beginning.
    fn play(&mut self, sound: Sound);

    /// Start a sound looping; starting an already-looping sound restarts it.
    fn start_loop(&mut self, sound: Sound);

    /// Stop a looping or playing sound.
    fn stop(&mut self, sound: Sound);

    fn set_muted(&mut self, muted: bool);
}

/// Sink for hosts without audio output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _sound: Sound) {}
    fn start_loop(&mut self, _sound: Sound) {}
    fn stop(&mut self, _sound: Sound) {}
    fn set_muted(&mut self, _muted: bool) {}
}
