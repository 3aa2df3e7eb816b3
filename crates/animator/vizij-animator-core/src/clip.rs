//! Motion-clip facade.
//!
//! The animator never advances clip time; the host figure/render system does.
//! States hold shared [`ClipHandle`]s acquired from a [`ClipProvider`] and read
//! timing through [`MotionClip`]. Acquire is a clone of the handle and release is
//! its drop, so every acquire is balanced by construction.

use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::path;

/// Read-mostly view over a host-owned playback clip.
pub trait MotionClip: Debug {
    fn start_time(&self) -> f32;
    fn end_time(&self) -> f32;
    /// Current playback position in clip seconds.
    fn eval_time(&self) -> f32;
    fn speed(&self) -> f32;
    fn set_speed(&self, speed: f32);

    /// Length of one evaluation pass.
    fn total_eval_time(&self) -> f32 {
        self.end_time() - self.start_time()
    }

    fn seek(&self, _time: f32) {}

    fn set_looping(&self, _looping: bool) {}
}

pub type ClipHandle = Rc<dyn MotionClip>;

/// Resolves clip paths into shared handles. Passed explicitly to whatever
/// needs to bind clips (state path changes, controller loads).
pub trait ClipProvider {
    fn acquire(&mut self, path: &str) -> Option<ClipHandle>;
}

/// Path-keyed clip cache. Hosts register decoded clips with [`ClipCache::insert`];
/// states acquire clones of the shared handles.
#[derive(Default, Debug)]
pub struct ClipCache {
    clips: HashMap<String, ClipHandle>,
}

impl ClipCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip under its normalized path, replacing any previous entry.
    pub fn insert(&mut self, clip_path: &str, clip: impl MotionClip + 'static) -> ClipHandle {
        let handle: ClipHandle = Rc::new(clip);
        self.clips.insert(path::normalize(clip_path), Rc::clone(&handle));
        handle
    }

    /// Outstanding references held outside the cache, or `None` when unknown.
    pub fn ref_count(&self, clip_path: &str) -> Option<usize> {
        self.clips
            .get(&path::normalize(clip_path))
            .map(|h| Rc::strong_count(h) - 1)
    }

    /// Drop clips nobody references anymore. Returns how many were evicted.
    pub fn release_unused(&mut self) -> usize {
        let before = self.clips.len();
        self.clips.retain(|_, h| Rc::strong_count(h) > 1);
        before - self.clips.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl ClipProvider for ClipCache {
    fn acquire(&mut self, clip_path: &str) -> Option<ClipHandle> {
        self.clips.get(&path::normalize(clip_path)).cloned()
    }
}

/// Simple clip timeline: a `[start, end]` window with a playhead.
/// Hosts without their own clip type can use this and call [`ClipTimeline::step`].
#[derive(Debug)]
pub struct ClipTimeline {
    start: f32,
    end: f32,
    time: Cell<f32>,
    speed: Cell<f32>,
    looping: Cell<bool>,
}

impl ClipTimeline {
    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start,
            end: end.max(start),
            time: Cell::new(start),
            speed: Cell::new(1.0),
            looping: Cell::new(true),
        }
    }

    /// Clip starting at 0 with the given length in seconds.
    pub fn with_length(length: f32) -> Self {
        Self::new(0.0, length)
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping.get()
    }

    /// Advance the playhead by `dt * speed`, wrapping when looping and clamping otherwise.
    pub fn step(&self, dt: f32) {
        let span = self.end - self.start;
        let mut t = self.time.get() + dt * self.speed.get();
        if span <= 0.0 {
            t = self.start;
        } else if self.looping.get() {
            let m = (t - self.start) % span;
            t = self.start + if m < 0.0 { m + span } else { m };
        } else {
            t = t.clamp(self.start, self.end);
        }
        self.time.set(t);
    }
}

impl MotionClip for ClipTimeline {
    fn start_time(&self) -> f32 {
        self.start
    }

    fn end_time(&self) -> f32 {
        self.end
    }

    fn eval_time(&self) -> f32 {
        self.time.get()
    }

    fn speed(&self) -> f32 {
        self.speed.get()
    }

    fn set_speed(&self, speed: f32) {
        self.speed.set(speed);
    }

    fn seek(&self, time: f32) {
        self.time.set(time.clamp(self.start, self.end));
    }

    fn set_looping(&self, looping: bool) {
        self.looping.set(looping);
    }
}
