use crate::platform::{InjectorId, InjectorOptions, Platform, SoundResource};

/// Plays one sound resource through a single lazily-created injector.
///
/// Re-triggering restarts the existing injector instead of spawning another,
/// so the same clip never overlaps itself. Playback is skipped until the
/// resource reports loaded.
pub struct SoundBuddy {
    sound: SoundResource,
    injector: Option<InjectorId>,
}

impl SoundBuddy {
    pub fn new(sound: SoundResource) -> SoundBuddy {
        SoundBuddy {
            sound,
            injector: None,
        }
    }

    pub fn play(&mut self, platform: &dyn Platform, options: &InjectorOptions) {
        if !platform.sound_loaded(&self.sound) {
            return;
        }
        match self.injector {
            Some(injector) => platform.restart_injector(injector, options),
            None => self.injector = platform.play_sound(&self.sound, options),
        }
    }
}
