pub const IDLE_CLIP: &str = "idle";
pub const WALK_CLIP: &str = "walk";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Walking,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

/// Playback state of one clip: looping time plus a blend weight that can be
/// faded in or out.
#[derive(Debug, Clone)]
pub struct ClipAction {
    pub name: String,
    duration: f32,
    time: f32,
    weight: f32,
    running: bool,
    fade: Option<Fade>,
}

impl ClipAction {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(f32::EPSILON),
            time: 0.0,
            weight: 0.0,
            running: false,
            fade: None,
        }
    }

    pub fn play(&mut self) {
        self.running = true;
        self.weight = 1.0;
        self.fade = None;
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    pub fn fade_in(&mut self, duration: f32) {
        self.running = true;
        self.start_fade(1.0, duration);
    }

    pub fn fade_out(&mut self, duration: f32) {
        self.start_fade(0.0, duration);
    }

    fn start_fade(&mut self, to: f32, duration: f32) {
        self.fade = Some(Fade {
            from: self.weight,
            to,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
        });
    }

    pub fn update(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.time = (self.time + dt) % self.duration;

        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed = (fade.elapsed + dt).min(fade.duration);
            let t = fade.elapsed / fade.duration;
            self.weight = fade.from + (fade.to - fade.from) * t;
            if fade.elapsed >= fade.duration {
                let target = fade.to;
                self.fade = None;
                if target == 0.0 {
                    self.running = false;
                }
            }
        }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn is_fading_in(&self) -> bool {
        matches!(self.fade, Some(f) if f.to == 1.0)
    }

    #[cfg(test)]
    pub fn is_fading_out(&self) -> bool {
        matches!(self.fade, Some(f) if f.to == 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AnimationState,
    pub to: AnimationState,
}

/// Idle/walk state machine that crossfades between the two clips.
#[derive(Debug, Clone)]
pub struct Animator {
    idle: ClipAction,
    walk: ClipAction,
    state: AnimationState,
    crossfade_secs: f32,
}

impl Animator {
    pub fn new(idle: ClipAction, walk: ClipAction, crossfade_secs: f32) -> Self {
        let mut idle = idle;
        idle.play();
        Self {
            idle,
            walk,
            state: AnimationState::Idle,
            crossfade_secs,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Switches to `Walking` when `moving`, `Idle` otherwise. Returns the
    /// transition when the state changed.
    pub fn set_moving(&mut self, moving: bool) -> Option<Transition> {
        let next = if moving {
            AnimationState::Walking
        } else {
            AnimationState::Idle
        };
        if next == self.state {
            return None;
        }

        let (outgoing, incoming) = match next {
            AnimationState::Walking => (&mut self.idle, &mut self.walk),
            AnimationState::Idle => (&mut self.walk, &mut self.idle),
        };
        outgoing.fade_out(self.crossfade_secs);
        incoming.reset();
        incoming.fade_in(self.crossfade_secs);

        let transition = Transition { from: self.state, to: next };
        self.state = next;
        Some(transition)
    }

    pub fn update(&mut self, dt: f32) {
        self.idle.update(dt);
        self.walk.update(dt);
    }

    #[cfg(test)]
    pub fn idle(&self) -> &ClipAction {
        &self.idle
    }

    #[cfg(test)]
    pub fn walk(&self) -> &ClipAction {
        &self.walk
    }

    /// Vertical bob for the rendered avatar, scaled by the walk clip's weight.
    pub fn bob(&self) -> f32 {
        let phase = self.walk.time() / self.walk.duration() * std::f32::consts::TAU;
        (phase * 2.0).sin().abs() * 0.15 * self.walk.weight()
    }
}
